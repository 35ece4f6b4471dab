/*
 *   Copyright (c) 2024 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

mod iter;
mod node;
mod tree;

pub use iter::Iter;
pub use tree::AdaptiveRadixTree;

#[cfg(test)]
mod tests {
    use super::AdaptiveRadixTree;

    #[test]
    fn insert_then_get_round_trips() {
        let mut tree = AdaptiveRadixTree::new();
        assert_eq!(tree.insert(b"hello", 1), None);
        assert_eq!(tree.insert(b"help", 2), None);
        assert_eq!(tree.insert(b"helicopter", 3), None);
        assert_eq!(tree.get(b"hello"), Some(&1));
        assert_eq!(tree.get(b"help"), Some(&2));
        assert_eq!(tree.get(b"helicopter"), Some(&3));
        assert_eq!(tree.get(b"hel"), None);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn insert_overwrites_existing_key() {
        let mut tree = AdaptiveRadixTree::new();
        assert_eq!(tree.insert(b"key", 1), None);
        assert_eq!(tree.insert(b"key", 2), Some(1));
        assert_eq!(tree.get(b"key"), Some(&2));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn prefix_of_existing_key_gets_its_own_leaf() {
        let mut tree = AdaptiveRadixTree::new();
        tree.insert(b"hello", 1);
        tree.insert(b"he", 2);
        assert_eq!(tree.get(b"hello"), Some(&1));
        assert_eq!(tree.get(b"he"), Some(&2));
    }

    #[test]
    fn growth_through_every_size_class() {
        let mut tree = AdaptiveRadixTree::new();
        // 300 single-byte-distinct keys forces a root that must grow
        // Node4 -> Node16 -> Node48 -> Node256.
        for b in 0u16..300 {
            let key = [b as u8, (b / 256) as u8];
            tree.insert(&key, b);
        }
        for b in 0u16..300 {
            let key = [b as u8, (b / 256) as u8];
            assert_eq!(tree.get(&key), Some(&b));
        }
        assert_eq!(tree.len(), 300);
    }

    #[test]
    fn remove_prunes_empty_nodes() {
        let mut tree = AdaptiveRadixTree::new();
        tree.insert(b"hello", 1);
        tree.insert(b"help", 2);
        assert_eq!(tree.remove(b"hello"), Some(1));
        assert_eq!(tree.get(b"hello"), None);
        assert_eq!(tree.get(b"help"), Some(&2));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.remove(b"nonexistent"), None);
    }

    #[test]
    fn remove_path_compresses_single_child_chain() {
        let mut tree = AdaptiveRadixTree::new();
        tree.insert(b"team", 1);
        tree.insert(b"test", 2);
        tree.insert(b"toast", 3);
        tree.remove(b"team");
        tree.remove(b"toast");
        assert_eq!(tree.get(b"test"), Some(&2));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.keys(), vec![b"test".to_vec()]);
    }

    #[test]
    fn remove_shrinks_back_through_every_size_class() {
        let mut tree = AdaptiveRadixTree::new();
        // Same 300-key shape as `growth_through_every_size_class`, so the
        // root grows Node4 -> Node16 -> Node48 -> Node256 on the way in.
        for b in 0u16..300 {
            let key = [b as u8, (b / 256) as u8];
            tree.insert(&key, b);
        }
        // Remove all but three entries, forcing the root back down
        // Node256 -> Node48 -> Node16 -> Node4.
        for b in 3u16..300 {
            let key = [b as u8, (b / 256) as u8];
            assert_eq!(tree.remove(&key), Some(b));
        }
        assert_eq!(tree.len(), 3);
        for b in 0u16..3 {
            let key = [b as u8, (b / 256) as u8];
            assert_eq!(tree.get(&key), Some(&b));
        }
        assert_eq!(tree.keys().len(), 3);
    }

    #[test]
    fn iter_yields_lexicographic_order() {
        let mut tree = AdaptiveRadixTree::new();
        for key in ["banana", "apple", "cherry", "app", "applesauce"] {
            tree.insert(key.as_bytes(), key);
        }
        let collected: Vec<_> = tree.iter().map(|(k, v)| (k, *v)).collect();
        let mut expected: Vec<_> = collected.iter().map(|(k, _)| k.clone()).collect();
        expected.sort();
        let actual: Vec<_> = collected.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(actual, expected);
        assert_eq!(collected.len(), 5);
    }
}
