use rank_tries::louds_trie::LoudsTrie;

fn main() {
    let pairs: Vec<(Vec<u8>, u32)> = ["a", "ab", "abc", "b", "bd", "ce"]
        .iter()
        .enumerate()
        .map(|(i, k)| (k.as_bytes().to_vec(), i as u32))
        .collect();

    let mut trie = LoudsTrie::build(pairs).unwrap();
    println!("built trie: {} keys, {} nodes", trie.len(), trie.node_count());

    for (key, value) in trie.iter() {
        println!("  {:?} -> {}", String::from_utf8_lossy(&key), value);
    }

    for probe in ["ab", "ac", "zz"] {
        println!("get {:?}: {:?}", probe, trie.get(probe.as_bytes()));
        println!(
            "predecessor of {:?}: {:?}",
            probe,
            trie.predecessor(probe.as_bytes()).ok().map(|(k, _)| k)
        );
    }

    trie.insert(b"abd", 99);
    trie.remove(b"ce");
    println!("after edits: {} keys, {} nodes", trie.len(), trie.node_count());
    for (key, value) in trie.iter() {
        println!("  {:?} -> {}", String::from_utf8_lossy(&key), value);
    }
}
