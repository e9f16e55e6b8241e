use crate::{BatchResultKind, CrawlOutcome, CrawlState, Effect, Msg, SessionState};

/// Pure update function: applies a message to the crawl state and returns any effects.
pub fn update(mut state: CrawlState, msg: Msg) -> (CrawlState, Vec<Effect>) {
    if state.session() == SessionState::Finished {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::ListingDiscovered {
            page_number,
            url,
            article_urls,
        } => {
            if state.session() != SessionState::Crawling {
                return (state, Vec::new());
            }
            state.note_listing_page();
            let urls = state.take_unseen(article_urls);
            if urls.is_empty() {
                Vec::new()
            } else {
                let batch_id = state.open_batch(page_number, url, urls.len());
                vec![Effect::ProcessBatch { batch_id, urls }]
            }
        }
        Msg::BatchFinished { batch_id, result } => {
            if !state.close_batch(batch_id, result) {
                return (state, Vec::new());
            }
            if state.session() == SessionState::Draining && !state.has_open_batches() {
                finish(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::PaginationExhausted => {
            if state.has_open_batches() {
                state.set_session(SessionState::Draining);
                Vec::new()
            } else {
                finish(&mut state)
            }
        }
    };

    (state, effects)
}

fn finish(state: &mut CrawlState) -> Vec<Effect> {
    state.set_session(SessionState::Finished);
    let batches = state.batches();
    let outcome = if batches.is_empty() {
        CrawlOutcome::NothingToFetch
    } else if batches
        .iter()
        .all(|batch| matches!(batch.result, Some(BatchResultKind::AllFailed { .. })))
    {
        CrawlOutcome::AllBatchesFailed {
            batches: batches.len(),
        }
    } else {
        CrawlOutcome::Completed {
            records: state.summary().records,
        }
    };
    vec![Effect::Finish { outcome }]
}
