use rank_tries::byte_map::ByteMap;

fn main() {
    let mut map = ByteMap::new();

    let words = ["car", "cart", "cat", "dog", "a", "ab"];
    for word in words {
        println!("inserting key: {:?}", word);
        map.insert(word.as_bytes(), word.len());
    }

    println!("entries in order:");
    for (key, value) in map.iter() {
        println!("  {:?} -> {}", String::from_utf8_lossy(&key), value);
    }

    for probe in ["cas", "cat", "b", "zzz"] {
        match map.predecessor(probe.as_bytes()) {
            Ok((key, _)) => println!(
                "predecessor of {:?} is {:?}",
                probe,
                String::from_utf8_lossy(&key)
            ),
            Err(e) => println!("predecessor of {:?} is none ({})", probe, e),
        }
        match map.successor(probe.as_bytes()) {
            Ok((key, _)) => println!(
                "successor of {:?} is {:?}",
                probe,
                String::from_utf8_lossy(&key)
            ),
            Err(e) => println!("successor of {:?} is none ({})", probe, e),
        }
    }
}
