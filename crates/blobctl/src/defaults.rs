pub const RPC_URL: &str = "http://127.0.0.1:8545";

pub const BEACON_P2P_ADDR: &str = "/ip4/127.0.0.1/tcp/13000";

pub const GAS_LIMIT: u64 = 21_000;

pub const PRIORITY_GAS_PRICE: &str = "2000000000";

pub const MAX_FEE_PER_BLOB_GAS: &str = "3000000000";

pub const CHAIN_ID: u64 = 1332;
