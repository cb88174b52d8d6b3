pub mod ai_service;
pub mod context_assembler;
pub mod fetcher;
pub mod ingestion;
pub mod intent_router;
pub mod market_data;
pub mod pacer;
pub mod persister;
pub mod session;
pub mod symbol_universe;
