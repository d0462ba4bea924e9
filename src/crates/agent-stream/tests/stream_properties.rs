use datapilot_agent_stream::{aggregate, decode, DecodeSession, ParsedEvent};
use proptest::prelude::*;

const KINDS: [&str; 8] = [
    "started", "thought", "action", "results", "final", "summary", "data", "message",
];

const FRAGMENTS: [&str; 12] = [
    "Thought: ",
    "Action: ",
    "Results: ",
    "Final Answer: ",
    "[Final Answer]: ",
    "look at sales",
    "sum column",
    "Revenue is $10k",
    "42",
    " ",
    "region, total",
    "THOUGHT:",
];

fn record() -> impl Strategy<Value = String> {
    let data_line = prop::collection::vec(prop::sample::select(FRAGMENTS.to_vec()), 0..4);
    (
        prop::sample::select(KINDS.to_vec()),
        prop::collection::vec(data_line, 1..4),
        any::<bool>(),
    )
        .prop_map(|(kind, lines, blank_line)| {
            let mut text = format!("event: {}\n", kind);
            for fragments in lines {
                text.push_str(&format!("data: {}\n", fragments.concat()));
            }
            if blank_line {
                text.push('\n');
            }
            text
        })
}

fn stream() -> impl Strategy<Value = (String, Vec<usize>)> {
    prop::collection::vec(record(), 0..8)
        .prop_map(|records| records.concat())
        .prop_flat_map(|input| {
            let len = input.len();
            (Just(input), prop::collection::vec(0..=len, 0..10))
        })
}

/// Feeds `input` split at `cuts`; returns the events emitted while pushing and
/// the session, still open.
fn feed_in_chunks(input: &str, mut cuts: Vec<usize>) -> (Vec<ParsedEvent>, DecodeSession) {
    cuts.sort_unstable();
    cuts.dedup();
    let mut session = DecodeSession::new();
    let mut events = Vec::new();
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(input.len())) {
        events.extend(session.push(&input[start..cut]));
        start = cut;
    }
    (events, session)
}

proptest! {
    #[test]
    fn chunked_decoding_matches_single_call((input, cuts) in stream()) {
        let whole = decode(&input);
        prop_assert_eq!(&whole.remainder, "");

        let (mut events, session) = feed_in_chunks(&input, cuts);
        events.extend(session.finish());
        prop_assert_eq!(&events, &whole.events);
        prop_assert_eq!(aggregate(&events), aggregate(&whole.events));
    }

    #[test]
    fn session_holds_back_at_most_the_last_record((input, cuts) in stream()) {
        let whole = decode(&input);
        let (events, session) = feed_in_chunks(&input, cuts);
        prop_assert!(events.len() + 1 >= whole.events.len());
        prop_assert_eq!(&events[..], &whole.events[..events.len()]);
        let held_back = decode(session.buffered()).events;
        prop_assert_eq!(held_back, whole.events[events.len()..].to_vec());
    }

    #[test]
    fn remainder_decodes_to_nothing(input in "(event: |data: |thought|final|Thought: |x|\n|\r| ){0,24}") {
        let first = decode(&input);
        let again = decode(&first.remainder);
        prop_assert!(again.events.is_empty());
        prop_assert_eq!(again.remainder, first.remainder);
    }
}
