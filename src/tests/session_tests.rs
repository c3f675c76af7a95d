use sequence_transform_core::{FunctionCode, Rule, TrieBuilder, code};
use tracing_test::traced_test;

use super::{KEY_GAP_MS, builtin_session, session_with, trie_of, type_str};
use crate::{Emission, KeyOutcome, Session, SimulatedOutput, SkipReason, config::Config};

fn key(ch: char) -> u8 {
    code::from_char(ch).unwrap()
}

#[test]
fn qk_expands_and_backspaces_back_to_boundary() {
    let mut session = session_with(trie_of(&[("qk", "quick", 1)]), Config::default());

    assert_eq!(
        session.process_key(key('q'), 10),
        KeyOutcome::Typed(Emission::new(0, "q"))
    );
    assert_eq!(
        session.process_key(key('k'), 20),
        KeyOutcome::Fired {
            emission: Emission::new(1, "quick"),
            function: FunctionCode::None,
        }
    );
    assert_eq!(session.sink().text(), " quick");
    assert_eq!(session.visible_text(), " quick");

    assert_eq!(session.backspace(30), KeyOutcome::Erased(Emission::new(4, "")));
    assert_eq!(session.sink().text(), " q");
    assert_eq!(session.backspace(40), KeyOutcome::Erased(Emission::new(1, "")));
    assert_eq!(session.sink().text(), " ");
    assert_eq!(session.visible_text(), " ");
}

#[test]
fn one_backspace_per_sequence_key_clears_the_screen() {
    for sequence in ["qk", "wd", "ppl", "th👆", "b👆", "dv", "dvt"] {
        let mut session = builtin_session();
        let mut now = 0;
        type_str(&mut session, sequence, &mut now);
        assert_ne!(session.sink().text(), " ", "{sequence} typed nothing");

        for _ in sequence.chars() {
            now += KEY_GAP_MS;
            session.backspace(now);
        }
        assert_eq!(session.sink().text(), " ", "after undoing {sequence}");
        assert_eq!(session.visible_text(), " ");
    }
}

#[test]
fn backspace_restores_text_a_rule_deleted() {
    let mut session = session_with(trie_of(&[("xy👆", "z", 2)]), Config::default());
    let mut now = 0;
    type_str(&mut session, "xy👆", &mut now);
    assert_eq!(session.sink().text(), " z");

    assert_eq!(
        session.backspace(now + KEY_GAP_MS),
        KeyOutcome::Erased(Emission::new(1, "xy"))
    );
    assert_eq!(session.sink().text(), " xy");
}

#[test]
fn plain_backspace_deletes_one_char_and_forgets_history() {
    let cfg = Config {
        enhanced_backspace: false,
        ..Config::default()
    };
    let mut session = session_with(trie_of(&[("qk", "quick", 1)]), cfg);
    let mut now = 0;
    type_str(&mut session, "qk", &mut now);

    assert_eq!(session.backspace(now), KeyOutcome::Erased(Emission::new(1, "")));
    assert_eq!(session.sink().text(), " quic");
    assert_eq!(session.visible_text(), " ");
}

#[test]
fn screen_matches_visible_text_after_a_sentence() {
    let mut session = builtin_session();
    let mut now = 0;
    type_str(&mut session, "i wd say qk dvt th👆 ppl", &mut now);

    let expected = " i would say quick development the people";
    assert_eq!(session.sink().text(), expected);
    assert_eq!(session.visible_text(), expected);
}

#[test]
fn unmatched_token_stays_in_history_unseen() {
    let mut session = builtin_session();
    let mut now = 0;
    type_str(&mut session, "x", &mut now);

    now += KEY_GAP_MS;
    assert_eq!(
        session.process_key(key('👇'), now),
        KeyOutcome::Skipped(SkipReason::UnmatchedToken)
    );
    assert_eq!(session.buffer().len(), 3);
    assert_eq!(session.sink().text(), " x");
    assert_eq!(session.visible_text(), " x");

    now += KEY_GAP_MS;
    assert_eq!(session.backspace(now), KeyOutcome::Erased(Emission::new(0, "")));
    assert_eq!(session.buffer().len(), 2);
    assert_eq!(session.sink().text(), " x");
    now += KEY_GAP_MS;
    assert_eq!(session.backspace(now), KeyOutcome::Erased(Emission::new(1, "")));
    assert_eq!(session.sink().text(), " ");
}

#[test]
fn token_prefixed_rule_fires_and_backspaces_cleanly() {
    let mut session = session_with(trie_of(&[("👆👆", "xx", 0)]), Config::default());
    let mut now = 0;
    type_str(&mut session, "👆", &mut now);
    assert_eq!(session.sink().text(), " ");

    now += KEY_GAP_MS;
    assert_eq!(
        session.process_key(key('👆'), now),
        KeyOutcome::Fired {
            emission: Emission::new(0, "xx"),
            function: FunctionCode::None,
        }
    );
    assert_eq!(session.sink().text(), " xx");
    assert_eq!(session.visible_text(), " xx");

    now += KEY_GAP_MS;
    assert_eq!(session.backspace(now), KeyOutcome::Erased(Emission::new(2, "")));
    now += KEY_GAP_MS;
    assert_eq!(session.backspace(now), KeyOutcome::Erased(Emission::new(0, "")));
    assert_eq!(session.sink().text(), " ");
    assert_eq!(session.visible_text(), " ");
}

fn backref_session() -> Session<SimulatedOutput> {
    let mut builder = TrieBuilder::new();
    builder
        .add_rule(Rule::with_backrefs("👆", 3, "", 0).unwrap())
        .unwrap();
    session_with(builder.build().unwrap(), Config::default())
}

#[test]
#[traced_test]
fn rule_reaching_past_history_is_refused() {
    let mut session = backref_session();

    assert_eq!(
        session.process_key(key('👆'), KEY_GAP_MS),
        KeyOutcome::Skipped(SkipReason::UnmatchedToken)
    );
    assert_eq!(session.buffer().at(0).unwrap().action_taken, None);
    assert_eq!(session.sink().text(), " ");
    assert_eq!(session.visible_text(), " ");
    assert!(logs_contain("rule refused"));

    assert_eq!(
        session.backspace(2 * KEY_GAP_MS),
        KeyOutcome::Erased(Emission::new(0, ""))
    );
    assert_eq!(session.sink().text(), " ");
}

#[test]
fn rule_with_enough_history_repeats_it() {
    let mut session = backref_session();
    let mut now = 0;
    type_str(&mut session, "abc", &mut now);

    now += KEY_GAP_MS;
    assert_eq!(
        session.process_key(key('👆'), now),
        KeyOutcome::Fired {
            emission: Emission::new(0, "abc"),
            function: FunctionCode::None,
        }
    );
    assert_eq!(session.sink().text(), " abcabc");
    assert_eq!(session.visible_text(), " abcabc");
}

#[test]
fn codes_outside_the_key_alphabet_are_skipped() {
    let mut session = builtin_session();
    for bad in [code::NONE, 0x80, code::backref(3).unwrap()] {
        assert_eq!(
            session.process_key(bad, 10),
            KeyOutcome::Skipped(SkipReason::InvalidCode)
        );
    }
    assert_eq!(session.buffer().len(), 1);
    assert_eq!(session.sink().text(), " ");
}

#[test]
fn upper_case_keys_match_lower_case_rules() {
    let mut session = session_with(trie_of(&[("qk", "quick", 1)]), Config::default());
    let mut now = 0;
    type_str(&mut session, "Q", &mut now);
    assert_eq!(session.sink().text(), " Q");

    type_str(&mut session, "K", &mut now);
    assert_eq!(session.sink().text(), " quick");
}

#[test]
fn idle_timeout_drops_history() {
    let cfg = Config {
        idle_timeout_ms: 1_000,
        ..Config::default()
    };
    let mut session = session_with(trie_of(&[("qk", "quick", 1)]), cfg);

    session.process_key(key('q'), 10);
    assert!(!session.poll_idle(500));
    assert_eq!(session.visible_text(), " q");

    let outcome = session.process_key(key('k'), 2_000);
    assert_eq!(outcome, KeyOutcome::Typed(Emission::new(0, "k")));
    assert_eq!(session.visible_text(), " k");
    assert_eq!(session.sink().text(), " qk");
}

#[test]
fn poll_idle_reports_a_reset_once() {
    let cfg = Config {
        idle_timeout_ms: 1_000,
        ..Config::default()
    };
    let mut session = session_with(trie_of(&[("qk", "quick", 1)]), cfg);
    assert!(!session.poll_idle(5_000));

    session.process_key(key('q'), 10);
    assert!(session.poll_idle(1_010));
    assert!(!session.poll_idle(9_000));
    assert_eq!(session.visible_text(), " ");
}

#[test]
fn zero_idle_timeout_never_resets() {
    let cfg = Config {
        idle_timeout_ms: 0,
        ..Config::default()
    };
    let mut session = session_with(trie_of(&[("qk", "quick", 1)]), cfg);
    session.process_key(key('q'), 10);
    assert!(!session.poll_idle(u64::MAX));

    session.process_key(key('k'), u64::MAX);
    assert_eq!(session.sink().text(), " quick");
}

#[test]
fn one_shot_shift_capitalises_the_next_letter() {
    let mut session = builtin_session();
    let mut now = 0;
    type_str(&mut session, "end.", &mut now);

    let outcome = session.process_key(key('👆'), now + KEY_GAP_MS);
    assert_eq!(
        outcome,
        KeyOutcome::Fired {
            emission: Emission::new(0, " "),
            function: FunctionCode::OneShotShift,
        }
    );

    now += KEY_GAP_MS;
    type_str(&mut session, "next", &mut now);
    assert_eq!(session.sink().text(), " end. Next");
    assert_eq!(session.visible_text(), " end. next");
}

#[test]
fn repeat_key_types_the_previous_key_again() {
    let mut session = builtin_session();
    let mut now = 0;
    type_str(&mut session, "ab", &mut now);

    let outcome = session.process_key(key('🔁'), now + KEY_GAP_MS);
    assert_eq!(
        outcome,
        KeyOutcome::Fired {
            emission: Emission::new(0, "b"),
            function: FunctionCode::RepeatLastKey,
        }
    );

    now += KEY_GAP_MS;
    type_str(&mut session, "c", &mut now);
    assert_eq!(session.sink().text(), " abbc");
    assert_eq!(session.visible_text(), " abbc");
}

#[test]
fn repeat_at_start_of_history_types_the_boundary() {
    let mut session = builtin_session();
    session.process_key(key('🔁'), 10);
    assert_eq!(session.sink().text(), "  ");
    assert_eq!(session.visible_text(), "  ");
}

#[test]
fn suppress_boundary_drops_only_a_following_space() {
    let mut session = builtin_session();
    let mut now = 0;
    type_str(&mut session, "g👉", &mut now);
    assert_eq!(session.sink().text(), " going ");

    now += KEY_GAP_MS;
    assert_eq!(
        session.process_key(code::BOUNDARY, now),
        KeyOutcome::Skipped(SkipReason::SuppressedBoundary)
    );
    type_str(&mut session, "to", &mut now);
    assert_eq!(session.sink().text(), " going to");
    assert_eq!(session.visible_text(), " going to");

    let mut session = builtin_session();
    let mut now = 0;
    type_str(&mut session, "g👉x ", &mut now);
    assert_eq!(session.sink().text(), " going x ");
}

#[test]
fn missed_rule_is_found_after_a_boundary() {
    let mut session = builtin_session();
    let mut now = 0;
    type_str(&mut session, "the quick ", &mut now);

    let found = session.find_missed_rule().unwrap();
    assert_eq!(found.sequence, "qk");
    assert_eq!(found.completion, "quick");
}

#[traced_test]
#[test]
fn missed_rule_is_logged_when_a_word_ends() {
    let mut session = builtin_session();
    let mut now = 0;
    type_str(&mut session, "people ", &mut now);

    assert!(logs_contain("missed rule"));
    assert!(logs_contain("sequence=ppl"));
}

#[traced_test]
#[test]
fn rule_output_is_not_reported_as_missed() {
    let mut session = builtin_session();
    let mut now = 0;
    type_str(&mut session, "qk ", &mut now);

    assert!(logs_contain("rule fired"));
    assert!(!logs_contain("missed rule"));
}

#[test]
fn reset_forgets_history_and_pending_functions() {
    let mut session = builtin_session();
    let mut now = 0;
    type_str(&mut session, "g👉", &mut now);
    session.reset();
    assert_eq!(session.visible_text(), " ");

    type_str(&mut session, " x", &mut now);
    assert_eq!(session.visible_text(), "  x");
}

#[test]
fn emissions_fold_deletions_into_typed_text() {
    let merged = Emission::new(1, "quick").then(Emission::new(2, "x"));
    assert_eq!(merged, Emission::new(1, "quix"));

    let merged = Emission::new(0, "ab").then(Emission::new(3, "c"));
    assert_eq!(merged, Emission::new(1, "c"));

    assert!(Emission::default().is_empty());
}

#[test]
fn skip_reasons_have_stable_names() {
    assert_eq!(SkipReason::InvalidCode.as_str(), "invalid_code");
    assert_eq!(SkipReason::UnmatchedToken.as_str(), "unmatched_token");
    assert_eq!(SkipReason::SuppressedBoundary.as_str(), "suppressed_boundary");
}
