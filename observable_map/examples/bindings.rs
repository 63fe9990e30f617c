//! Mirrors a map into a "view" the way a data-binding layer would, using only notifications.
#![allow(missing_docs)]
use observable_map::{MapChange, MapEvent, ObservableMap, Property};
use std::{cell::RefCell, rc::Rc};

fn main() {
    observable_map_logger::setup();

    let mut prices: ObservableMap<String, Rc<f64>> = ObservableMap::with_capacity(8);

    // A bound list widget only sees the notifications, never the map itself.
    let view = Rc::new(RefCell::new(Vec::<(String, f64)>::new()));
    let sink = view.clone();
    prices.subscribe_all(move |change: &MapChange<'_, String, Rc<f64>>| {
        let mut rows = sink.borrow_mut();
        match *change {
            MapChange::Added { key, value } => rows.push((key.clone(), **value)),
            MapChange::Removed { key, .. } => rows.retain(|(row, _)| row != key),
            MapChange::Changed { key, new_value, .. } => {
                if let Some(row) = rows.iter_mut().find(|(row, _)| row == key) {
                    row.1 = **new_value;
                }
            }
            MapChange::Cleared => rows.clear(),
        }
    });
    prices.subscribe(MapEvent::ItemChanged, |change| {
        log::info!(
            "{:?} changed from {:?} to {:?}",
            change.key(),
            change.old_value(),
            change.new_value()
        );
    });
    prices.on_property_changed(|property| {
        if property == Property::Count {
            log::debug!("row count changed");
        }
    });

    let apple = Rc::new(1.25);
    prices.set("apple".into(), apple.clone());
    prices.set("pear".into(), Rc::new(2.0));
    prices.set("plum".into(), Rc::new(0.5));

    // storing the very same instance again is not a change
    prices.set("apple".into(), apple);
    prices.set("pear".into(), Rc::new(2.5));

    if let Err(err) = prices.add("plum".into(), Rc::new(9.0)) {
        log::warn!("could not add plum: {err}");
    }
    prices.remove("apple");

    log::info!("map:  {prices:?}");
    log::info!("view: {:?}", view.borrow());

    prices.clear();
    log::info!("view after clear: {:?}", view.borrow());
}
