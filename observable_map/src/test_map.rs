#![allow(missing_docs)]
use crate::{ByIdentity, ByValue, ChangeDetection, MapChange, MapError, ObservableMap, Property};
use indexmap::IndexMap;
use rand::prelude::*;
use std::{
    cell::RefCell,
    fmt::Debug,
    hash::{BuildHasherDefault, Hash},
    rc::Rc,
};
use zwohash::ZwoHasher;

type ZwoMap<K, V, C = ByValue> = ObservableMap<K, V, BuildHasherDefault<ZwoHasher>, C>;

/// What the reference model expects from a change detection policy for owned test values.
trait ModelPolicy {
    /// Whether storing a value equal to the previous one is reported.
    const REPORTS_EQUAL: bool;
}

impl ModelPolicy for ByValue {
    const REPORTS_EQUAL: bool = false;
}

impl ModelPolicy for ByIdentity {
    const REPORTS_EQUAL: bool = true;
}

#[derive(Debug, PartialEq, Eq)]
enum Recorded<K, V> {
    Added(K, V),
    Removed(K, V),
    Changed(K, V, V),
    Cleared,
    Property(Property),
}

type Log<K, V> = Rc<RefCell<Vec<Recorded<K, V>>>>;

/// Drives an [`ObservableMap`] and an order-preserving [`IndexMap`] side by side and checks that
/// results, contents and notifications agree after every operation.
struct CheckedMap<K, V, C> {
    dut: ZwoMap<K, V, C>,
    ref_map: IndexMap<K, V>,
    log: Log<K, V>,
    expected: Vec<Recorded<K, V>>,
}

impl<K, V, C> CheckedMap<K, V, C>
where
    K: Hash + Eq + Clone + Debug + 'static,
    V: Eq + Clone + Debug + 'static,
    C: ChangeDetection<V> + ModelPolicy,
{
    fn new() -> Self {
        let log = Log::default();
        let mut dut: ZwoMap<K, V, C> = ObservableMap::new();
        let changes = log.clone();
        dut.subscribe_all(move |change: &MapChange<'_, K, V>| {
            let recorded = match *change {
                MapChange::Added { key, value } => Recorded::Added(key.clone(), value.clone()),
                MapChange::Removed { key, value } => Recorded::Removed(key.clone(), value.clone()),
                MapChange::Changed {
                    key,
                    old_value,
                    new_value,
                } => Recorded::Changed(key.clone(), old_value.clone(), new_value.clone()),
                MapChange::Cleared => Recorded::Cleared,
            };
            changes.borrow_mut().push(recorded);
        });
        let properties = log.clone();
        dut.on_property_changed(move |property| {
            properties.borrow_mut().push(Recorded::Property(property))
        });
        CheckedMap {
            dut,
            ref_map: IndexMap::new(),
            log,
            expected: vec![],
        }
    }
    fn len(&self) -> usize {
        self.ref_map.len()
    }
    fn expect_structure(&mut self) {
        self.expected
            .extend(Property::ALL.into_iter().map(Recorded::Property));
    }
    fn check_log(&mut self) {
        let recorded = std::mem::take(&mut *self.log.borrow_mut());
        let expected = std::mem::take(&mut self.expected);
        assert_eq!(recorded, expected);
    }
    fn try_get(&mut self, key: &K) -> Option<V> {
        let ref_result = self.ref_map.get(key).cloned();
        let dut_result = self.dut.try_get(key).cloned();
        assert_eq!(ref_result, dut_result);
        assert_eq!(self.dut.get(key).ok().cloned(), ref_result);
        assert_eq!(self.dut.contains_key(key), ref_result.is_some());
        assert_eq!(
            self.dut.get_index_of(key),
            self.ref_map.get_index_of(key)
        );
        self.check_log();
        ref_result
    }
    fn get_index(&mut self, index: usize) -> Option<(K, V)> {
        let ref_result = self
            .ref_map
            .get_index(index)
            .map(|(k, v)| (k.clone(), v.clone()));
        let dut_result = self
            .dut
            .get_index(index)
            .map(|(k, v)| (k.clone(), v.clone()));
        assert_eq!(ref_result, dut_result);
        ref_result
    }
    fn add(&mut self, key: K, value: V) -> Result<(), MapError> {
        let ref_result = if self.ref_map.contains_key(&key) {
            Err(MapError::DuplicateKey)
        } else {
            self.ref_map.insert(key.clone(), value.clone());
            self.expect_structure();
            self.expected.push(Recorded::Added(key.clone(), value.clone()));
            Ok(())
        };
        let dut_result = self.dut.add(key, value);
        assert_eq!(ref_result, dut_result);
        self.check_log();
        ref_result
    }
    fn expect_update(&mut self, key: &K, old: Option<&V>, new: &V) {
        match old {
            None => {
                self.expect_structure();
                self.expected.push(Recorded::Added(key.clone(), new.clone()));
            }
            Some(old) if C::REPORTS_EQUAL || old != new => {
                self.expected
                    .push(Recorded::Changed(key.clone(), old.clone(), new.clone()));
            }
            Some(_) => {}
        }
    }
    fn add_or_update(&mut self, key: K, value: V) -> Option<V> {
        let ref_result = self.ref_map.insert(key.clone(), value.clone());
        self.expect_update(&key, ref_result.as_ref(), &value);
        let dut_result = self.dut.add_or_update(key, value);
        assert_eq!(ref_result, dut_result);
        self.check_log();
        ref_result
    }
    fn add_or_update_with(&mut self, key: K, value: V, update: impl Fn(&K, &V) -> V) -> Option<V> {
        let new_value = match self.ref_map.get(&key) {
            Some(old) => update(&key, old),
            None => value.clone(),
        };
        let ref_result = self.ref_map.insert(key.clone(), new_value.clone());
        self.expect_update(&key, ref_result.as_ref(), &new_value);
        let dut_result = self.dut.add_or_update_with(key, value, update);
        assert_eq!(ref_result, dut_result);
        self.check_log();
        ref_result
    }
    fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let ref_result = self.ref_map.shift_remove_entry(key);
        if let Some((k, v)) = &ref_result {
            self.expect_structure();
            self.expected.push(Recorded::Removed(k.clone(), v.clone()));
        }
        let dut_result = self.dut.remove_entry(key);
        assert_eq!(ref_result, dut_result);
        self.check_log();
        ref_result
    }
    fn clear(&mut self) {
        self.ref_map.clear();
        self.expected.push(Recorded::Cleared);
        self.expect_structure();
        self.dut.clear();
        self.check_log();
    }
    fn copy_to(&mut self, padding: usize, filler: (K, V)) {
        let mut buffer = vec![filler.clone(); padding + self.len()];
        self.dut.copy_to(&mut buffer, padding).unwrap();
        assert!(buffer[..padding].iter().all(|slot| *slot == filler));
        assert!(Iterator::eq(
            buffer[padding..].iter().map(|(k, v)| (k, v)),
            self.ref_map.iter()
        ));
        if padding > 0 && self.len() > 0 {
            let mut short = vec![filler; padding + self.len() - 1];
            assert!(matches!(
                self.dut.copy_to(&mut short, padding),
                Err(MapError::IndexOutOfRange { .. })
            ));
        }
        self.check_log();
    }
    fn check(&mut self) {
        self.dut.check();
        assert_eq!(self.dut.len(), self.ref_map.len());
        assert!(Iterator::eq(self.ref_map.iter(), self.dut.iter()));
        assert!(Iterator::eq(self.ref_map.keys(), self.dut.keys()));
        assert!(Iterator::eq(self.ref_map.values(), self.dut.values()));
        self.check_log();
    }
    /// NB: `random_likelihood` is **not** a probability. `random_likelihood == 2.0` would be 2:1 odds random:present, i.e. 2/3 probability.
    fn present_or_random_key<R: Rng + SeedableRng>(
        &self,
        random_likelihood: f64,
        rng: &mut R,
        mut rand_k: impl FnMut(&mut R) -> K,
    ) -> K {
        debug_assert!(random_likelihood >= 0.0);
        match self.ref_map.keys().choose(rng) {
            Some(key) if rng.gen_range(0.0..1.0 + random_likelihood) < 1.0 => key.clone(),
            _ => rand_k(rng),
        }
    }
    fn random_index<R: Rng + SeedableRng>(&self, error_likelihood: f64, rng: &mut R) -> usize {
        let max = (self.len() as f64 * (1.0 + error_likelihood)).ceil() as usize;
        rng.gen_range(0..=max)
    }
}

macro_rules! weighted_choose {
    ($rng:expr, $($name:ident: $weight:expr => $body:expr),+) => {
        {
            enum Branches { $( $name,  )* }
            let weights = [$((Branches::$name, $weight)),+];
            match weights.choose_weighted($rng, |x| x.1).unwrap().0 {
                $(Branches::$name => $body),*
            }
        }
    }
}

fn test_suite<K, V, C, R>(
    mut rand_k: impl FnMut(&mut R) -> K,
    mut rand_v: impl FnMut(&mut R) -> V,
    update_fn: impl Fn(&K, &V) -> V,
) where
    K: Hash + Eq + Clone + Debug + 'static,
    V: Eq + Clone + Debug + 'static,
    C: ChangeDetection<V> + ModelPolicy,
    R: Rng + SeedableRng,
{
    let mut map: CheckedMap<K, V, C> = CheckedMap::new();
    let mut rng = R::seed_from_u64(39);
    let mut max_size = 0;
    let verbosity = 1;
    for _ in 0..5000 {
        weighted_choose! {&mut rng,
            Add: 1.0 => {
                let k = map.present_or_random_key(4.0, &mut rng, &mut rand_k);
                let v = rand_v(&mut rng);
                let result = map.add(k.clone(), v.clone());
                if verbosity > 0 {
                    println!("adding {k:?}: {v:?} -> {result:?}");
                }
            },
            AddOrUpdate: 1.0 => {
                let k = map.present_or_random_key(4.0, &mut rng, &mut rand_k);
                let v = rand_v(&mut rng);
                let result = map.add_or_update(k.clone(), v.clone());
                if verbosity > 0 {
                    println!("adding or updating {k:?}: {v:?} -> {result:?}");
                }
            },
            AddOrUpdateWith: 0.5 => {
                let k = map.present_or_random_key(1.0, &mut rng, &mut rand_k);
                let v = rand_v(&mut rng);
                let result = map.add_or_update_with(k.clone(), v.clone(), &update_fn);
                if verbosity > 0 {
                    println!("adding or updating with {k:?}: {v:?} -> {result:?}");
                }
            },
            Get: 0.5 => {
                let k = map.present_or_random_key(1.0, &mut rng, &mut rand_k);
                let result = map.try_get(&k);
                if verbosity > 0 {
                    println!("getting {k:?} -> {result:?}");
                }
            },
            GetIndex: 0.3 => {
                let index = map.random_index(0.1, &mut rng);
                let result = map.get_index(index);
                if verbosity > 0 {
                    println!("getting index {index:?} -> {result:?}");
                }
            },
            Remove: 0.8 => {
                let k = map.present_or_random_key(1.0, &mut rng, &mut rand_k);
                let result = map.remove(&k);
                if verbosity > 0 {
                    println!("removing {k:?} -> {result:?}");
                }
            },
            Clear: 0.01 => {
                let old_len = map.len();
                map.clear();
                if verbosity > 0 {
                    println!("clearing {old_len} entries");
                }
            },
            CopyTo: 0.05 => {
                let padding = rng.gen_range(0..4);
                let filler = (rand_k(&mut rng), rand_v(&mut rng));
                map.copy_to(padding, filler);
                if verbosity > 0 {
                    println!("copying to offset {padding}");
                }
            },
            Check: 0.15 => {
                map.check();
            }
        };
        max_size = std::cmp::max(max_size, map.len());
    }
    map.check();
    println!("max size {max_size}");
}

#[test]
fn test_suite_usize_usize() {
    test_suite::<usize, usize, ByValue, rand_pcg::Pcg64>(
        |rng| rng.gen::<usize>() >> rng.gen_range(0..usize::BITS),
        |rng| rng.gen_range(0..4),
        |k, v| if k % 3 == 0 { *v } else { v.wrapping_add(1) },
    );
}

#[test]
fn test_suite_usize_usize_by_identity() {
    test_suite::<usize, usize, ByIdentity, rand_pcg::Pcg64>(
        |rng| rng.gen::<usize>() >> rng.gen_range(0..usize::BITS),
        |rng| rng.gen_range(0..4),
        |k, v| if k % 3 == 0 { *v } else { v.wrapping_add(1) },
    );
}

#[test]
fn test_suite_boxed_usize_boxed_usize() {
    test_suite::<Box<usize>, Box<usize>, ByValue, rand_pcg::Pcg64>(
        |rng| Box::new(rng.gen::<usize>() >> rng.gen_range(0..usize::BITS)),
        |rng| Box::new(rng.gen_range(0..4)),
        |_, v| Box::new(**v % 2),
    );
}

#[test]
fn test_suite_string_string() {
    test_suite::<String, String, ByValue, rand_pcg::Pcg64>(
        |rng| {
            let len = rng.gen_range(1..4);
            String::from_iter((0..len).map(|_| rng.gen_range('a'..'e')))
        },
        |rng| {
            let len = rng.gen_range(0..3);
            String::from_iter((0..len).map(|_| rng.gen_range('x'..'z')))
        },
        |k: &String, v: &String| {
            if k.len() > 2 {
                v.clone()
            } else {
                format!("{v}{k}")
            }
        },
    );
}

#[test]
fn test_suite_string_string_by_identity() {
    test_suite::<String, String, ByIdentity, rand_pcg::Pcg64>(
        |rng| {
            let len = rng.gen_range(1..3);
            String::from_iter((0..len).map(|_| rng.gen_range('a'..'d')))
        },
        |rng| String::from(if rng.gen() { "x" } else { "y" }),
        |_, v: &String| v.clone(),
    );
}

#[test]
fn test_removal_preserves_order() {
    let mut rng = rand_pcg::Pcg64::seed_from_u64(10);
    let mut in_data: Vec<(u32, u64)> = (0..1000).map(|_| (rng.gen(), rng.gen())).collect();
    let mut seen = std::collections::HashSet::new();
    in_data.retain(|item| seen.insert(item.0));
    let mut map: ZwoMap<u32, u64> = in_data.iter().copied().collect();
    let mut out_data = in_data.clone();
    out_data.retain(|&(key, value)| (key as u64).wrapping_add(value) % 7 != 4);
    for &(key, value) in &in_data {
        if (key as u64).wrapping_add(value) % 7 == 4 {
            assert!(map.remove(&key));
        }
    }
    map.check();
    assert_eq!(
        map.iter().map(|(&k, &v)| (k, v)).collect::<Vec<_>>(),
        out_data
    );
}
