//! Test utilities for manzai_server tests.
//!
//! Mock collaborators and helpers for building orchestrators and requests.

#![allow(dead_code)]

pub mod mock_client;
pub mod mock_store;

pub use mock_client::{MockGenerationClient, MockResponse};
pub use mock_store::{CountingUsageStore, FailingUsageStore};

use manzai_core::{GenerationRequestInput, LengthValue, UsageRecord, UserKey};
use manzai_interface::{GenerationClient, UsageStore};
use manzai_ledger::InMemoryUsageStore;
use manzai_prompt::{SeededRandom, TechniqueCatalog};
use manzai_server::{ApiState, ManzaiConfig, RequestOrchestrator, StoreKind, create_router};
use std::sync::Arc;

/// The line every finished script ends with when the default cast is used.
pub const DEFAULT_CLOSING_LINE: &str = "ツッコミ: もうええわ、どうもありがとうございました。";

/// Defaults with an in-memory store and a short timeout.
pub fn test_config() -> ManzaiConfig {
    let mut config = ManzaiConfig::default();
    config.metering.store = StoreKind::Memory;
    config.model.timeout_secs = 5;
    config
}

/// Orchestrator over the bundled catalog and a seeded random source.
pub fn orchestrator(
    config: &ManzaiConfig,
    client: Arc<dyn GenerationClient>,
    store: Arc<dyn UsageStore>,
) -> RequestOrchestrator {
    let catalog = TechniqueCatalog::bundled().expect("Bundled catalog parses");
    RequestOrchestrator::new(
        config,
        client,
        store,
        Arc::new(catalog),
        Arc::new(SeededRandom::new(7)),
    )
}

/// Router over [`orchestrator`].
pub fn router(
    config: &ManzaiConfig,
    client: Arc<dyn GenerationClient>,
    store: Arc<dyn UsageStore>,
) -> axum::Router {
    let orchestrator = orchestrator(config, client, store);
    create_router(ApiState::new(
        Arc::new(orchestrator),
        config.server.production,
    ))
}

/// A valid request body.
pub fn request(length: u32, user_key: Option<&str>) -> GenerationRequestInput {
    GenerationRequestInput {
        theme: Some("回転寿司".to_string()),
        genre: Some("しゃべくり".to_string()),
        characters: None,
        length: Some(LengthValue::Number(f64::from(length))),
        user_key: user_key.map(str::to_string),
        ..Default::default()
    }
}

/// In-memory store seeded with one user.
pub fn store_with(key: &str, free_used_count: u32, paid_credits: u32) -> Arc<InMemoryUsageStore> {
    Arc::new(InMemoryUsageStore::with_records([(
        UserKey::new(key).expect("Valid user key"),
        UsageRecord::new(free_used_count, paid_credits),
    )]))
}

/// A single boke line whose normalized script is `32 + filler` characters.
///
/// `ボケ: ` is four characters, the first pass terminates the line with `。`
/// and the closing line adds twenty-seven.
pub fn short_script(filler: usize) -> String {
    format!("ボケ: {}", "あ".repeat(filler))
}

/// A well-formed routine with a title.
pub fn sample_script() -> String {
    "タイトル：回転寿司の逆襲\n\n\
     ボケ: 最近、回転寿司で働き始めたんやけどな。\n\
     ツッコミ: ほう、ええやないか。\n\
     ボケ: 寿司が回るんやなくて、店員が回ってるんや。\n\
     ツッコミ: どんな店やねん！\n\
     ボケ: 客席も回ってて、目が回るねん。\n\
     ツッコミ: もう遊園地やないか！"
        .to_string()
}

/// A routine far longer than any small target.
pub fn long_script(turns: usize) -> String {
    (0..turns)
        .map(|i| {
            if i % 2 == 0 {
                "ボケ: 昨日な、駅前の回転寿司でマグロが逆向きに回っとったんや。".to_string()
            } else {
                "ツッコミ: そんなわけあるかい、ちゃんと見てから言え。".to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
