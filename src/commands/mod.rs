pub mod chat_cmd;
pub mod scrape_cmd;
