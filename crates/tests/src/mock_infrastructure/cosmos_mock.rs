//! Cosmos node mock builder.
//!
//! Wraps mockito to provide the REST, Tendermint and Web3 responses the gateway reads.

use mockito::{Matcher, Mock, Server, ServerOpts};
use serde_json::json;
use std::time::Duration;

pub const LATEST_BLOCK_PATH: &str = "/cosmos/base/tendermint/v1beta1/blocks/latest";
pub const SIMULATE_PATH: &str = "/cosmos/tx/v1beta1/simulate";
pub const BROADCAST_PATH: &str = "/cosmos/tx/v1beta1/txs";

/// One mock node. Each helper returns the created [`Mock`] so tests can assert call counts.
pub struct CosmosMockBuilder {
    server: Server,
}

impl CosmosMockBuilder {
    pub async fn new() -> Self {
        // Dedicated server, not the shared pool: `mock_slow_get` blocks the server thread, and a
        // pooled server would carry that stall into whichever test picks it up next.
        Self { server: Server::new_with_opts_async(ServerOpts::default()).await }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Mocks `GET path` with a fixed status and body.
    pub async fn mock_get(&mut self, path: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock("GET", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Mocks `GET path` answering only after `delay`, for timeout tests.
    pub async fn mock_slow_get(&mut self, path: &str, delay: Duration) -> Mock {
        self.server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_chunked_body(move |w| {
                std::thread::sleep(delay);
                w.write_all(b"{\"height\":\"1\"}")
            })
            .create_async()
            .await
    }

    /// Mocks a path that must never be requested.
    pub async fn mock_never(&mut self, method: &str, path: impl Into<Matcher>) -> Mock {
        self.server.mock(method, path).expect(0).create_async().await
    }

    /// Mocks the REST latest block endpoint.
    pub async fn mock_latest_block(&mut self, height: u64, chain_id: &str) -> Mock {
        let body = json!({
            "block_id": {"hash": "AAAA"},
            "block": {"header": {"chain_id": chain_id, "height": height.to_string()}}
        });
        self.mock_get(LATEST_BLOCK_PATH, 200, &body.to_string()).await
    }

    /// Mocks the Tendermint `/status` endpoint.
    pub async fn mock_status(&mut self, height: u64, network: &str) -> Mock {
        let body = json!({
            "jsonrpc": "2.0",
            "id": -1,
            "result": {
                "node_info": {"network": network},
                "sync_info": {"latest_block_height": height.to_string(), "catching_up": false}
            }
        });
        self.mock_get("/status", 200, &body.to_string()).await
    }

    /// Mocks an ethermint `EthAccount` for `address`.
    pub async fn mock_eth_account(&mut self, address: &str, number: u64, sequence: u64) -> Mock {
        let body = json!({
            "account": {
                "@type": "/ethermint.types.v1.EthAccount",
                "base_account": {
                    "address": address,
                    "pub_key": null,
                    "account_number": number.to_string(),
                    "sequence": sequence.to_string()
                },
                "code_hash": "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
            }
        });
        self.mock_get(&format!("/cosmos/auth/v1beta1/accounts/{address}"), 200, &body.to_string())
            .await
    }

    /// Mocks a plain cosmos `BaseAccount` for `address`.
    pub async fn mock_base_account(&mut self, address: &str, number: u64, sequence: u64) -> Mock {
        let body = json!({
            "account": {
                "@type": "/cosmos.auth.v1beta1.BaseAccount",
                "address": address,
                "pub_key": null,
                "account_number": number.to_string(),
                "sequence": sequence.to_string()
            }
        });
        self.mock_get(&format!("/cosmos/auth/v1beta1/accounts/{address}"), 200, &body.to_string())
            .await
    }

    /// Mocks the feemarket params endpoint with a decimal `min_gas_price`.
    pub async fn mock_fee_market(&mut self, min_gas_price: &str) -> Mock {
        let body = json!({ "params": { "min_gas_price": min_gas_price } });
        self.mock_get("/evmos/feemarket/v1/params", 200, &body.to_string()).await
    }

    /// Mocks a chain-side 404 for an unknown account.
    pub async fn mock_missing_account(&mut self, address: &str) -> Mock {
        let body = json!({
            "code": 5,
            "message": format!("rpc error: code = NotFound desc = account {address} not found: key not found"),
            "details": []
        });
        self.mock_get(&format!("/cosmos/auth/v1beta1/accounts/{address}"), 404, &body.to_string())
            .await
    }

    /// Mocks the IBC light client status query.
    pub async fn mock_client_status(&mut self, client_id: &str, status: &str) -> Mock {
        let body = json!({ "status": status });
        self.mock_get(
            &format!("/ibc/core/client/v1/client_status/{client_id}"),
            200,
            &body.to_string(),
        )
        .await
    }

    /// Mocks `eth_gasPrice` on a Web3 endpoint, expected `hits` times.
    pub async fn mock_gas_price(&mut self, wei: u128, hits: usize) -> Mock {
        self.server
            .mock("POST", "/")
            .match_body(Matcher::Regex(r#""method"\s*:\s*"eth_gasPrice""#.to_string()))
            .expect(hits)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": format!("0x{wei:x}")}).to_string())
            .create_async()
            .await
    }

    /// Mocks `eth_blockNumber` on a Web3 endpoint.
    pub async fn mock_block_number(&mut self, height: u64) -> Mock {
        self.server
            .mock("POST", "/")
            .match_body(Matcher::Regex(r#""method"\s*:\s*"eth_blockNumber""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": format!("0x{height:x}")}).to_string())
            .create_async()
            .await
    }

    /// Mocks a successful simulation of exactly `tx_bytes_b64`.
    pub async fn mock_simulate_ok(&mut self, tx_bytes_b64: &str) -> Mock {
        self.server
            .mock("POST", SIMULATE_PATH)
            .match_body(Matcher::Json(json!({ "tx_bytes": tx_bytes_b64 })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"gas_info":{"gas_wanted":"0","gas_used":"104520"},"result":{"data":"","log":"","events":[]}}"#)
            .create_async()
            .await
    }

    /// Mocks a simulation rejected with `raw_log`.
    pub async fn mock_simulate_error(&mut self, raw_log: &str) -> Mock {
        self.server
            .mock("POST", SIMULATE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "error": raw_log }).to_string())
            .create_async()
            .await
    }

    /// Mocks a simulation endpoint answering `status` with `body`.
    pub async fn mock_simulate_status(&mut self, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", SIMULATE_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Mocks a sync-mode broadcast of exactly `tx_bytes_b64` returning `code`.
    pub async fn mock_broadcast(
        &mut self,
        tx_bytes_b64: &str,
        code: u32,
        tx_hash: &str,
        raw_log: &str,
    ) -> Mock {
        let body = json!({
            "tx_response": {
                "height": "0",
                "txhash": tx_hash,
                "codespace": if code == 0 { "" } else { "sdk" },
                "code": code,
                "raw_log": raw_log
            }
        });
        self.server
            .mock("POST", BROADCAST_PATH)
            .match_body(Matcher::Json(
                json!({ "tx_bytes": tx_bytes_b64, "mode": "BROADCAST_MODE_SYNC" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Mocks a broadcast endpoint failing with `status`.
    pub async fn mock_broadcast_status(&mut self, status: usize) -> Mock {
        self.server
            .mock("POST", BROADCAST_PATH)
            .with_status(status)
            .with_body(r#"{"code":2,"message":"internal error"}"#)
            .create_async()
            .await
    }
}
