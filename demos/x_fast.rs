use rank_tries::x_fast_trie::XFastTrie;

fn main() {
    let mut trie = XFastTrie::new(1);

    let keys = vec![10u8, 5, 15, 3, 12];

    for key in &keys {
        println!("inserting key: {}", key);
        trie.insert(&[*key], u64::from(*key)).unwrap();
    }

    trie.pretty_print();

    println!("testing predecessor queries:");
    let queries = vec![2u8, 6, 8, 11, 13, 20];
    for query in queries {
        match trie.predecessor(&[query]) {
            Ok((key, _)) => println!("predecessor of {} is {}", query, key[0]),
            Err(e) => println!("predecessor of {} is none ({})", query, e),
        }
    }

    println!("testing successor queries:");
    for query in [2u8, 10, 15] {
        match trie.successor(&[query]) {
            Ok((key, _)) => println!("successor of {} is {}", query, key[0]),
            Err(e) => println!("successor of {} is none ({})", query, e),
        }
    }
}
