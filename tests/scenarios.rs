//! End-to-end scenarios across the store, the dispatcher and bindings.

use featurestore::builder::{on_deinitialize, on_initialize, on_transition, BindingBuilder};
use featurestore::core::{
    ExpectedMutation, Feature, FeatureKey, Guard, MutationOutcome, ReadDataError, Store, StoreError,
};
use featurestore::dispatcher::{Dispatcher, Observer, Origin, Report};
use featurestore::{feature, feature_state, Binding};
use std::sync::{Arc, Mutex};

feature_state! {
    pub enum PlayerState {
        Stopped,
        Playing { track: u32 },
        Paused { track: u32 },
    }
}

static PLAYER_EVENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn player_event(event: String) {
    PLAYER_EVENTS.lock().unwrap().push(event);
}

feature!(pub Player => PlayerState, bindings = vec![
    on_initialize::<Player, _>("player up", |state| player_event(format!("up:{state:?}"))),
    on_transition::<Player, _>("player playing", "Playing", |state| {
        if let PlayerState::Playing { track } = state {
            player_event(format!("playing:{track}"));
        }
    }),
    on_deinitialize::<Player, _>("player down", |_| player_event("down".to_string())),
]);

feature!(pub Queue => PlayerState);
feature!(pub Volume => PlayerState);

#[test]
fn double_initialize_is_a_semantic_mismatch() {
    let mut store = Store::new();

    let first = store.initialize::<Queue>(PlayerState::Stopped).unwrap();
    assert!(matches!(first, MutationOutcome::Initialization { .. }));

    let mismatch = store.initialize::<Queue>(PlayerState::Stopped).unwrap_err();
    assert_eq!(mismatch.expected, ExpectedMutation::Initialization);
    match mismatch.actual {
        MutationOutcome::Actualization { old, new } => {
            assert_eq!(old, new);
            assert_eq!(old.variant(), "Stopped");
        }
        other => panic!("unexpected outcome: {other}"),
    }
    assert_eq!(store.history().len(), 1);
}

#[test]
fn removing_an_absent_feature() {
    let mut store = Store::new();

    let lenient = store.remove::<Queue>(None, false).unwrap();
    assert_eq!(
        lenient,
        MutationOutcome::NothingToRemove {
            key: FeatureKey::of::<Queue>()
        }
    );

    assert!(store.remove::<Queue>(None, true).is_err());
    assert!(store.remove::<Queue>(Some("Stopped"), false).is_err());
}

#[test]
fn transition_then_same_variant_actualizes() {
    let mut store = Store::new();
    store.initialize::<Queue>(PlayerState::Stopped).unwrap();

    let moved = store
        .transition::<Queue>(PlayerState::Playing { track: 1 }, Some("Stopped"))
        .unwrap();
    assert!(matches!(moved, MutationOutcome::Transition { .. }));

    let again = store
        .write::<Queue>(PlayerState::Playing { track: 2 }, ExpectedMutation::Auto)
        .unwrap();
    assert!(matches!(again, MutationOutcome::Actualization { .. }));

    assert_eq!(
        store.history().variant_path(&FeatureKey::of::<Queue>()),
        vec!["Stopped", "Playing", "Playing"]
    );
}

#[test]
fn typed_fetches_report_absence_and_wrong_variant() {
    let mut store = Store::new();

    assert_eq!(
        store.fetch::<Volume>(),
        Err(ReadDataError::FeatureNotFound {
            feature: Volume::name()
        })
    );

    store.initialize::<Volume>(PlayerState::Stopped).unwrap();
    assert_eq!(
        store.fetch_variant::<Volume>("Paused"),
        Err(ReadDataError::StateTypeMismatch {
            feature: Volume::name(),
            expected: "Paused",
            actual: "Stopped",
        })
    );
    assert_eq!(store.fetch_variant::<Volume>("Stopped"), Ok(PlayerState::Stopped));
}

#[test]
fn feature_bindings_follow_feature_lifetime() {
    let mut dispatcher = Dispatcher::new();
    let key = FeatureKey::of::<Player>();

    dispatcher
        .transact(Origin::new("power on"), |store: &mut Store| {
            store.initialize::<Player>(PlayerState::Stopped)
        })
        .unwrap();
    assert_eq!(dispatcher.installed_bindings(&key).len(), 3);

    dispatcher
        .transact(Origin::new("play"), |store: &mut Store| {
            store.transition::<Player>(PlayerState::Playing { track: 7 }, Some("Stopped"))
        })
        .unwrap();

    dispatcher
        .transact(Origin::new("power off"), |store: &mut Store| {
            store.remove::<Player>(None, true)
        })
        .unwrap();
    assert!(dispatcher.installed_bindings(&key).is_empty());

    // Torn down: this commit reaches no player binding.
    dispatcher
        .transact(Origin::new("queue"), |store: &mut Store| {
            store.initialize::<Queue>(PlayerState::Stopped)
        })
        .unwrap();

    assert_eq!(
        *PLAYER_EVENTS.lock().unwrap(),
        vec!["up:Stopped".to_string(), "playing:7".to_string(), "down".to_string()]
    );
}

feature_state! {
    pub enum BannerState {
        Hidden,
        Shown { text: String },
    }
}

static BANNER_DROPS: Mutex<u32> = Mutex::new(0);

feature!(pub Banner => BannerState, bindings = vec![
    on_deinitialize::<Banner, _>("banner dropped", |_| *BANNER_DROPS.lock().unwrap() += 1),
]);

#[test]
fn reinitializing_in_the_same_transaction_keeps_bindings() {
    let mut dispatcher = Dispatcher::new();
    let key = FeatureKey::of::<Banner>();

    dispatcher
        .transact(Origin::new("show"), |store: &mut Store| -> Result<(), StoreError> {
            store.initialize::<Banner>(BannerState::Shown { text: "hi".into() })?;
            Ok(())
        })
        .unwrap();

    dispatcher
        .transact(Origin::new("replace"), |store: &mut Store| -> Result<(), StoreError> {
            store.remove::<Banner>(Some("Shown"), true)?;
            store.initialize::<Banner>(BannerState::Hidden)?;
            Ok(())
        })
        .unwrap();

    assert_eq!(*BANNER_DROPS.lock().unwrap(), 1);
    assert_eq!(dispatcher.installed_bindings(&key).len(), 1);
    assert_eq!(dispatcher.store().get::<Banner>(), Some(BannerState::Hidden));
}

struct Devtools {
    seen: Arc<Mutex<Vec<String>>>,
    reports: Mutex<Vec<Report>>,
}

impl Devtools {
    fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
            reports: Mutex::new(Vec::new()),
        }
    }
}

impl Observer for Devtools {
    fn bindings(&self) -> Vec<Binding> {
        let sink = Arc::clone(&self.seen);
        vec![BindingBuilder::new("volume changes")
            .guard(Guard::touches::<Volume>().and(Guard::new(|m: &MutationOutcome| {
                !matches!(m, MutationOutcome::NothingToRemove { .. })
            })))
            .given(|m, snapshot| Some(format!("{m} with {} features", snapshot.len())))
            .then(move |line| sink.lock().unwrap().push(line))
            .build()
            .unwrap()]
    }

    fn on_report(&self, report: &Report) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

#[test]
fn observers_see_reports_until_released() {
    let mut dispatcher = Dispatcher::new();
    let devtools = Arc::new(Devtools::new());
    dispatcher.subscribe(&devtools);
    assert_eq!(dispatcher.observer_count(), 1);

    dispatcher
        .transact(Origin::new("mute"), |store: &mut Store| -> Result<(), StoreError> {
            store.initialize::<Queue>(PlayerState::Stopped)?;
            store.initialize::<Volume>(PlayerState::Paused { track: 0 })?;
            Ok(())
        })
        .unwrap();

    let _ = dispatcher.transact(Origin::new("broken"), |store: &mut Store| -> Result<(), StoreError> {
        store.actualize::<Volume>(PlayerState::Stopped)?;
        Ok(())
    });

    {
        let seen = devtools.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("initialization(Volume.Paused)"));
        assert!(seen[0].ends_with("with 2 features"));

        let reports = devtools.reports.lock().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_committed());
        assert!(!reports[1].is_committed());
        assert_eq!(reports[1].origin.name(), "broken");
    }

    let seen = Arc::clone(&devtools.seen);
    drop(devtools);
    assert_eq!(dispatcher.observer_count(), 0);

    dispatcher
        .transact(Origin::new("unmute"), |store: &mut Store| -> Result<(), StoreError> {
            store.remove::<Volume>(None, true)?;
            Ok(())
        })
        .unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn unsubscribed_observer_stops_receiving() {
    let mut dispatcher = Dispatcher::new();
    let devtools = Arc::new(Devtools::new());
    let id = dispatcher.subscribe(&devtools);

    assert!(dispatcher.unsubscribe(id));
    dispatcher
        .transact(Origin::new("quiet"), |store: &mut Store| -> Result<(), StoreError> {
            store.initialize::<Volume>(PlayerState::Stopped)?;
            Ok(())
        })
        .unwrap();

    assert!(devtools.reports.lock().unwrap().is_empty());
    assert!(devtools.seen.lock().unwrap().is_empty());
}

mod billing {
    featurestore::feature_state! {
        pub enum SettingsState {
            Plan { seats: u32 },
        }
    }

    featurestore::feature!(pub Settings => SettingsState);
}

mod profile {
    featurestore::feature!(pub Settings => super::billing::SettingsState);
}

#[test]
fn same_named_features_in_different_modules_stay_apart() {
    use billing::SettingsState::Plan;
    use featurestore::checkpoint::Checkpoint;

    let mut store = Store::new();
    store.initialize::<billing::Settings>(Plan { seats: 1 }).unwrap();
    store.initialize::<profile::Settings>(Plan { seats: 2 }).unwrap();
    assert_ne!(billing::Settings::name(), profile::Settings::name());

    let snapshot = store.snapshot();
    assert_eq!(snapshot.shared_name(), None);
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json.as_object().unwrap().len(), 2);

    let checkpoint = Checkpoint::capture(&snapshot).unwrap();
    assert_eq!(checkpoint.state::<billing::Settings>().unwrap(), Some(Plan { seats: 1 }));
    assert_eq!(checkpoint.state::<profile::Settings>().unwrap(), Some(Plan { seats: 2 }));
}
