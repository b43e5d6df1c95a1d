use rand::prelude::*;
use rank_tries::y_fast_trie::YFastTrie;

fn main() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut keys: Vec<u16> = (0..1000).map(|_| rng.gen_range(0..=u16::MAX)).collect();
    keys.sort();
    keys.dedup();

    let mut trie = YFastTrie::new(2);
    for &key in &keys {
        trie.insert(&key.to_be_bytes(), key).unwrap();
    }

    trie.pretty_print();

    let probe = keys[keys.len() / 2];
    println!("probe key: {}", probe);
    println!("contains: {}", trie.contains(&probe.to_be_bytes()));
    println!("predecessor: {:?}", trie.predecessor(&probe.to_be_bytes()).ok());
    println!("successor: {:?}", trie.successor(&probe.to_be_bytes()).ok());
    println!("min: {:?}", trie.min());
    println!("max: {:?}", trie.max());
    println!("cluster sizes: {:?}", trie.cluster_sizes());
}
