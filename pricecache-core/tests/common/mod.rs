//! Shared helpers for integration tests.

use serde_json::json;
use wiremock::{Mock, MockServer};

/// Mock Tiingo server driven from a runtime owned by the test, so the
/// blocking client can be called from the plain test thread.
pub struct MockApi {
    pub server: MockServer,
    rt: tokio::runtime::Runtime,
}

impl MockApi {
    pub fn start() -> Self {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn reset(&self) {
        self.rt.block_on(self.server.reset());
    }

    pub fn verify(&self) {
        self.rt.block_on(self.server.verify());
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }
}

pub fn info_json(ticker: &str, start: &str, end: &str) -> serde_json::Value {
    json!({
        "ticker": ticker,
        "name": format!("{ticker} Fund"),
        "exchangeCode": "NASDAQ",
        "description": "",
        "startDate": start,
        "endDate": end
    })
}

pub fn price_json(date: &str, close: f64, volume: i64) -> serde_json::Value {
    json!({
        "date": format!("{date}T00:00:00.000Z"),
        "open": close - 0.5,
        "high": close + 1.0,
        "low": close - 1.0,
        "close": close,
        "volume": volume,
        "adjOpen": close - 0.5,
        "adjHigh": close + 1.0,
        "adjLow": close - 1.0,
        "adjClose": close,
        "adjVolume": volume,
        "divCash": 0.0,
        "splitFactor": 1.0
    })
}
