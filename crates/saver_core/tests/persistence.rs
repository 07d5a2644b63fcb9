use pretty_assertions::assert_eq;
use saver_core::{update, AppState, ChannelSnapshot, ChannelStatus, Msg};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn snapshot(name: &str, alias: Option<&str>, quality: &str) -> ChannelSnapshot {
    ChannelSnapshot {
        name: name.to_string(),
        alias: alias.map(str::to_string),
        quality: quality.to_string(),
    }
}

#[test]
fn restored_channels_round_trip_through_snapshot() {
    init_logging();
    let saved = vec![
        snapshot("zeta", None, "maximum"),
        snapshot("alpha", Some("Alpha TV"), "720p"),
    ];
    let (state, effects) = update(AppState::new(), Msg::RestoreChannels(saved));
    assert!(effects.is_empty());

    // Rows come back sorted by name.
    assert_eq!(
        state.channels_snapshot(),
        vec![
            snapshot("alpha", Some("Alpha TV"), "720p"),
            snapshot("zeta", None, "maximum"),
        ]
    );

    let view = state.view();
    assert_eq!(view.channels[0].display_name, "Alpha TV");
    assert_eq!(view.channels[1].display_name, "zeta");
    assert!(view
        .channels
        .iter()
        .all(|row| row.status == ChannelStatus::Unknown));
}

#[test]
fn saved_edit_replaces_alias_and_quality() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::RestoreChannels(vec![snapshot("alpha", Some("Old"), "maximum")]),
    );
    let (state, _) = update(state, Msg::ChannelSaved(snapshot("alpha", None, "480p")));

    assert_eq!(state.channels_snapshot(), vec![snapshot("alpha", None, "480p")]);
}
