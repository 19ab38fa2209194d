pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_DATABASE_NAME: &str = "rotamelli";

pub const DEFAULT_LOGS_DIR: &str = "./logs";

/// Unit value multiplied into the monthly loose-package total.
pub const DEFAULT_AVULSO_UNIT: f64 = 2.0;

/// Cap on the unfiltered "most recent" listing.
pub const RECENT_LIST_LIMIT: i64 = 100;

/// Largest count magnitude accepted from clients (exact-integer range of an f64).
pub const MAX_COUNT: i64 = 9_007_199_254_740_991;

/// Rows per batch submitted by the bulk import.
pub const IMPORT_CHUNK_SIZE: usize = 10;

pub const ROUTES_TABLE: &str = "rotas";

pub const EXPENSES_TABLE: &str = "despesas";
