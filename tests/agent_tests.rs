//! Agent registry: registration, authentication, profiles, leaderboard.

mod support;

use support::{economy, memory_store, open_market, option_id, register};
use tote::application::{self, place_wager};
use tote::error::{Error, ErrorKind};

#[test]
fn registration_issues_a_key_and_the_starting_balance() {
    let store = memory_store();
    let registration = application::register(&store, &economy(), "ada").unwrap();

    assert!(registration.api_key.starts_with("ak_"));
    assert_eq!(registration.api_key.len(), 3 + 64);
    assert_eq!(registration.agent.balance, 100);
    assert_eq!(registration.agent.name, "ada");
}

#[test]
fn the_api_key_never_appears_after_registration() {
    let store = memory_store();
    let registration = register(&store, "ada");

    // The profile is the public surface; serialize it and make sure the
    // key is nowhere in it.
    let profile = application::profile(&store, &registration.agent.id).unwrap();
    let serialized = serde_json::to_string(&profile).unwrap();
    assert!(!serialized.contains(&registration.api_key));

    // Serializing the agent itself skips the key too.
    let serialized = serde_json::to_string(&registration.agent).unwrap();
    assert!(!serialized.contains(&registration.api_key));
}

#[test]
fn duplicate_names_conflict_and_bad_names_fail_validation() {
    let store = memory_store();
    register(&store, "ada");

    let err = application::register(&store, &economy(), "ada").unwrap_err();
    assert!(matches!(err, Error::NameTaken { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    for name in ["a", "bad;name", ""] {
        let err = application::register(&store, &economy(), name).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "name {name:?}");
    }
}

#[test]
fn authentication_resolves_keys_to_agents() {
    let store = memory_store();
    let registration = register(&store, "ada");

    let agent = application::authenticate(&store, &registration.api_key)
        .unwrap()
        .expect("known key must authenticate");
    assert_eq!(agent.id, registration.agent.id);

    let unknown = application::authenticate(&store, "ak_deadbeef").unwrap();
    assert!(unknown.is_none());
}

#[test]
fn profiles_track_wins_losses_and_net_profit() {
    let store = memory_store();
    let eco = economy();
    let winner = register(&store, "winner");
    let loser = register(&store, "loser");

    let market = open_market(&store, "Who ends up in profit?", &["Yes", "No"]);
    place_wager(&store, &eco, &winner.agent.id, market.id(), &option_id(&market, 0), 40).unwrap();
    place_wager(&store, &eco, &loser.agent.id, market.id(), &option_id(&market, 1), 60).unwrap();

    let open_market_2 = open_market(&store, "Still pending, this one?", &["Yes", "No"]);
    place_wager(
        &store,
        &eco,
        &winner.agent.id,
        open_market_2.id(),
        &option_id(&open_market_2, 0),
        5,
    )
    .unwrap();

    application::resolve_market(&store, market.id(), &option_id(&market, 0), None).unwrap();

    let profile = application::profile(&store, &winner.agent.id).unwrap();
    // Staked 40, won the whole 100-coin pool.
    assert_eq!(profile.balance, 100 - 40 - 5 + 100);
    assert_eq!(profile.stats.total_wagers, 2);
    assert_eq!(profile.stats.total_won, 1);
    assert_eq!(profile.stats.total_lost, 0);
    assert_eq!(profile.stats.net_profit, 60);

    let profile = application::profile(&store, &loser.agent.id).unwrap();
    assert_eq!(profile.stats.total_lost, 1);
    assert_eq!(profile.stats.net_profit, -60);

    // Recent wagers carry their market context, newest first.
    let recent = &application::profile(&store, &winner.agent.id).unwrap().recent_wagers;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].market_title, "Still pending, this one?");
    assert_eq!(recent[0].payout, None);
    assert_eq!(recent[1].option_label, "Yes");
    assert_eq!(recent[1].payout, Some(100));
}

#[test]
fn missing_agents_are_not_found() {
    let store = memory_store();
    let err = application::profile(&store, &tote::domain::AgentId::from("ghost")).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn the_leaderboard_ranks_by_balance() {
    let store = memory_store();
    let eco = economy();
    let first = register(&store, "first");
    let second = register(&store, "second");
    let third = register(&store, "third");

    let market = open_market(&store, "Who climbs the ladder?", &["Yes", "No"]);
    place_wager(&store, &eco, &first.agent.id, market.id(), &option_id(&market, 0), 50).unwrap();
    place_wager(&store, &eco, &second.agent.id, market.id(), &option_id(&market, 1), 50).unwrap();
    application::resolve_market(&store, market.id(), &option_id(&market, 0), None).unwrap();

    let board = application::leaderboard(&store).unwrap();
    let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["first", "third", "second"]);
    assert_eq!(board[0].balance, 150);
    assert_eq!(board[1].balance, 100);
    assert_eq!(board[2].balance, 50);
}
