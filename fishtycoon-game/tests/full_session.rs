use fishtycoon_game::{
    CatchPhase, Catalog, GameConfig, GameEngine, GameEvent, MailKind, MemoryStore, UpgradeId,
};
use std::collections::BTreeMap;

const START: u64 = 1_760_000_000_000;
const HOUR_MS: u64 = 3_600_000;

type Engine = GameEngine<'static, MemoryStore>;

fn open(store: MemoryStore, seed: u64, now: u64) -> Engine {
    GameEngine::open(Catalog::bundled(), GameConfig::default(), store, seed, now).unwrap()
}

/// Buy whatever is affordable, cheapest first, and fish where species are still missing.
fn greedy_step(engine: &mut Engine) {
    engine.catch_now().unwrap();
    engine.sell_all().unwrap();

    let catalog = engine.catalog();
    for location in catalog.locations() {
        if !engine.ledger().is_location_unlocked(&location.id) {
            engine.unlock_location(&location.id).unwrap();
            break;
        }
    }
    let mut upgrades: Vec<(u64, UpgradeId)> = UpgradeId::ALL
        .iter()
        .filter_map(|id| engine.ledger().upgrades().next_cost(*id).map(|cost| (cost, *id)))
        .collect();
    upgrades.sort_unstable();
    for (cost, id) in upgrades {
        if cost <= engine.ledger().money() / 4 {
            engine.purchase_upgrade(id).unwrap();
        }
    }

    let target = catalog
        .locations()
        .iter()
        .filter(|location| engine.ledger().is_location_unlocked(&location.id))
        .find(|location| {
            catalog.species_at(&location.id).any(|fish| {
                !engine
                    .ledger()
                    .encyclopedia()
                    .entry(&fish.id)
                    .is_some_and(|entry| entry.discovered)
            })
        })
        .or_else(|| {
            catalog
                .locations()
                .iter()
                .rev()
                .find(|location| engine.ledger().is_location_unlocked(&location.id))
        })
        .map(|location| location.id.clone());
    if let Some(target) = target {
        engine.set_active_location(&target).unwrap();
    }
}

#[test]
fn greedy_session_reaches_prestige() {
    let store = MemoryStore::new();
    let mut engine = open(store.clone(), 0xDEC0DE, START);
    let mut caught = 0;
    let mut discovered: BTreeMap<String, bool> = BTreeMap::new();

    let mut steps = 0;
    while !engine.can_prestige() {
        assert!(steps < 60_000, "no prestige after {steps} steps: {:?}", engine.stats());
        greedy_step(&mut engine);
        steps += 1;

        let ledger = engine.ledger();
        assert!(ledger.total_fish_caught() >= caught);
        caught = ledger.total_fish_caught();
        for (id, entry) in ledger.encyclopedia().iter() {
            let was = discovered.insert(id.to_string(), entry.discovered);
            assert!(entry.discovered || was != Some(true), "{id} was forgotten");
        }
    }

    let discovered_before = engine.ledger().encyclopedia().discovered_count();
    let outcome = engine.perform_prestige().unwrap().unwrap();
    assert_eq!(outcome.new_level, 1);
    let ledger = engine.ledger();
    assert_eq!(ledger.money(), 100);
    assert_eq!(ledger.active_location(), "pond");
    assert_eq!(ledger.encyclopedia().discovered_count(), discovered_before);
    assert!(ledger.total_fish_caught() >= 1_000);
    assert!(
        ledger
            .inbox()
            .messages()
            .any(|mail| mail.kind == MailKind::Prestige)
    );
    assert!(engine.stats().fishing_power >= 1.5);
    assert!(engine.perform_prestige().unwrap().is_none());

    let reopened = open(store, 1, engine.now());
    assert_eq!(reopened.ledger().prestige_level(), 1);
}

#[test]
fn paced_auto_fishing_respects_phase_order() {
    let mut engine = open(MemoryStore::new(), 21, START);
    while engine.ledger().money() < 200 {
        engine.catch_now().unwrap();
        engine.sell_all().unwrap();
    }
    assert!(engine.purchase_upgrade(UpgradeId::Auto).unwrap());
    let caught = engine.ledger().total_fish_caught();

    let mut phases = Vec::new();
    let mut catches = 0;
    let mut now = engine.now();
    for _ in 0..(10 * 60 * 4) {
        now += 250;
        for event in engine.tick(now).unwrap() {
            match event {
                GameEvent::PhaseStarted { phase, automatic } => {
                    assert!(automatic);
                    phases.push(phase);
                }
                GameEvent::Caught(report) => {
                    assert!(report.automatic);
                    assert_eq!(phases.last(), Some(&CatchPhase::Splashing));
                    catches += report.count();
                }
                GameEvent::ActionFinished => {
                    assert_eq!(phases.last(), Some(&CatchPhase::Settling));
                }
                GameEvent::AutoFishSkipped | GameEvent::AutoSold { .. } => {}
            }
        }
    }
    assert!(catches >= 60, "only {catches} auto catches in ten minutes");
    assert_eq!(engine.ledger().total_fish_caught(), caught + catches as u64);
    for window in phases.windows(2) {
        let expected = window[0].next().unwrap_or(CatchPhase::Casting);
        assert_eq!(window[1], expected);
    }
}

#[test]
fn manual_casts_while_fishing_are_ignored() {
    let mut engine = open(MemoryStore::new(), 4, START);
    assert!(engine.start_fishing());
    for _ in 0..5 {
        assert!(!engine.start_fishing());
    }
    engine.tick(START + 10_000).unwrap();
    assert_eq!(engine.ledger().total_fish_caught(), 1);
}

#[test]
fn returning_player_gets_offline_progress_once() {
    let store = MemoryStore::new();
    let mut engine = open(store.clone(), 12, START);
    while engine.ledger().money() < 200 {
        engine.catch_now().unwrap();
        engine.sell_all().unwrap();
    }
    assert!(engine.purchase_upgrade(UpgradeId::Auto).unwrap());
    let left_at = engine.now();
    let caught = engine.ledger().total_fish_caught();
    drop(engine);

    let back = left_at + 2 * HOUR_MS;
    let engine = open(store.clone(), 12, back);
    let report = engine.last_offline_report();
    assert!(report.fish_gained > 0);
    assert_eq!(engine.ledger().total_fish_caught(), caught + report.fish_gained);
    assert!(
        engine
            .ledger()
            .inbox()
            .messages()
            .any(|mail| mail.kind == MailKind::OfflineReport)
    );
    drop(engine);

    let again = open(store, 12, back);
    assert!(again.last_offline_report().is_empty());
    assert_eq!(again.ledger().total_fish_caught(), caught + report.fish_gained);
}

#[test]
fn resume_inside_a_running_engine_backfills_once() {
    let mut engine = open(MemoryStore::new(), 13, START);
    while engine.ledger().money() < 200 {
        engine.catch_now().unwrap();
        engine.sell_all().unwrap();
    }
    assert!(engine.purchase_upgrade(UpgradeId::Auto).unwrap());
    let back = engine.now() + HOUR_MS;
    let first = engine.resume(back).unwrap();
    assert!(first.fish_gained > 0);
    assert!(engine.resume(back).unwrap().is_empty());
}

#[test]
fn reset_wipes_progress_and_timers() {
    let mut engine = open(MemoryStore::new(), 17, START);
    while engine.ledger().money() < 200 {
        engine.catch_now().unwrap();
        engine.sell_all().unwrap();
    }
    engine.purchase_upgrade(UpgradeId::Auto).unwrap();
    engine.set_auto_sell(true).unwrap();
    engine.start_fishing();
    engine.reset_progress().unwrap();
    let stats = engine.stats();
    assert_eq!(stats.money, 0);
    assert_eq!(stats.total_fish_caught, 0);
    assert_eq!(stats.fishing_phase, None);
    let now = engine.now();
    assert!(engine.tick(now + HOUR_MS).unwrap().is_empty());
}
