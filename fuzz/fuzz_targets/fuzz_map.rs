//! Fuzz the open-addressing hash map
//!
//! Each byte triple is decoded into a put, remove or adjust on a small key
//! space, so inserts collide with tombstones and rehashes happen often. The
//! map must agree with std's HashMap after every step.

#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use vectorcore::OpenIntDoubleHashMap;

fuzz_target!(|data: &[u8]| {
    let Ok(mut map) = OpenIntDoubleHashMap::with_capacity(0) else {
        return;
    };
    let mut model: HashMap<i32, f64> = HashMap::new();

    for chunk in data.chunks_exact(3) {
        let key = i32::from(chunk[1]);
        let value = f64::from(chunk[2]) - 128.0;
        match chunk[0] % 3 {
            0 => {
                let added = map.put(key, value);
                assert_eq!(added, model.insert(key, value).is_none());
            }
            1 => {
                assert_eq!(map.remove(key), model.remove(&key).is_some());
            }
            _ => {
                let expected = *model.entry(key).and_modify(|v| *v += 1.0).or_insert(value);
                assert_eq!(map.adjust_or_put_value(key, value, 1.0), expected);
            }
        }
        assert_eq!(map.len(), model.len());
        assert!(map.len() <= map.high_water_mark());
    }

    for (&key, &value) in &model {
        assert_eq!(map.lookup(key), Some(value));
    }
});
