//! A sign-in flow driven through the dispatcher.
//!
//! Run with `cargo run --example session_flow`.

use featurestore::builder::{on_deinitialize, on_transition};
use featurestore::checkpoint::Checkpoint;
use featurestore::core::{Store, StoreError};
use featurestore::dispatcher::{Dispatcher, Observer, Origin, Report};
use featurestore::enforcement::RulesBuilder;
use featurestore::{feature, feature_state};
use std::sync::Arc;

feature_state! {
    pub enum SessionState {
        Anonymous,
        SignedIn { user: String },
    }
}

feature_state! {
    pub enum CartState {
        Empty,
        Filled { items: Vec<String> },
    }
}

feature!(pub Session => SessionState, bindings = vec![
    on_transition::<Session, _>("welcome", "SignedIn", |state| {
        if let SessionState::SignedIn { user } = state {
            println!("  [binding] welcome back, {user}");
        }
    }),
    on_deinitialize::<Session, _>("goodbye", |_| println!("  [binding] session closed")),
]);

feature!(pub Cart => CartState);

struct ConsoleLog;

impl Observer for ConsoleLog {
    fn on_report(&self, report: &Report) {
        match report.rejection() {
            None => {
                println!("  [observer] {} committed:", report.origin.name());
                for mutation in report.mutations() {
                    println!("    - {mutation}");
                }
            }
            Some(reason) => println!("  [observer] {} rejected: {reason}", report.origin.name()),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rules = RulesBuilder::new().max_mutations(8).build();
    let mut dispatcher = Dispatcher::new().with_rules(rules);

    let log = Arc::new(ConsoleLog);
    dispatcher.subscribe(&log);

    println!("launch");
    dispatcher.transact(Origin::new("launch"), |store: &mut Store| -> Result<(), StoreError> {
        store.initialize::<Session>(SessionState::Anonymous)?;
        store.initialize::<Cart>(CartState::Empty)?;
        Ok(())
    })?;

    println!("sign in");
    dispatcher.transact(Origin::new("sign in"), |store: &mut Store| -> Result<(), StoreError> {
        store.transition::<Session>(
            SessionState::SignedIn {
                user: "ann".to_string(),
            },
            Some("Anonymous"),
        )?;
        store.transition::<Cart>(
            CartState::Filled {
                items: vec!["tea".to_string()],
            },
            Some("Empty"),
        )?;
        Ok(())
    })?;

    println!("sign in twice");
    let result = dispatcher.transact(Origin::new("sign in again"), |store: &mut Store| -> Result<(), StoreError> {
        store.initialize::<Session>(SessionState::Anonymous)?;
        Ok(())
    });
    if let Err(error) = result {
        println!("  refused: {error}");
    }

    let checkpoint = Checkpoint::capture(&dispatcher.store().snapshot())?;
    println!("checkpoint:\n{}", checkpoint.to_json()?);

    println!("sign out");
    dispatcher.reset(Origin::new("sign out"))?;

    println!("restore");
    dispatcher.transact(Origin::new("restore"), |store: &mut Store| {
        checkpoint.restore::<Session>(store)?;
        checkpoint.restore::<Cart>(store)
    })?;

    println!("cart: {:?}", dispatcher.store().get::<Cart>());
    Ok(())
}
