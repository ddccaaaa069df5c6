//! Deep merge of a `serde_yaml::Value` override tree onto a parsed
//! config document: mappings recurse, lists and scalars replace
//! wholesale, per `spec.md` §4.2.

use serde_yaml::Value;

pub fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_val) => merge_yaml(base_val, overlay_val),
                    None => {
                        base_map.insert(key, overlay_val);
                    }
                }
            }
        }
        (base_slot, overlay_val) => {
            *base_slot = overlay_val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn mappings_recurse() {
        let mut base = yaml("a:\n  b: 1\n  c: 2\n");
        let overlay = yaml("a:\n  b: 9\n");
        merge_yaml(&mut base, overlay);
        assert_eq!(base, yaml("a:\n  b: 9\n  c: 2\n"));
    }

    #[test]
    fn lists_replace_wholesale() {
        let mut base = yaml("a: [1, 2, 3]\n");
        let overlay = yaml("a: [9]\n");
        merge_yaml(&mut base, overlay);
        assert_eq!(base, yaml("a: [9]\n"));
    }

    #[test]
    fn scalars_replace() {
        let mut base = yaml("a: 1\n");
        let overlay = yaml("a: 2\n");
        merge_yaml(&mut base, overlay);
        assert_eq!(base, yaml("a: 2\n"));
    }
}
