pub const DEFAULT_BUCKET_COUNT: usize = 256;
pub const DEFAULT_FLUSH_THRESHOLD: usize = 512 * 1024;
pub const DEFAULT_WORKER_THREADS: usize = 4;
pub const DEFAULT_IO_BUFFER_SIZE_KB: usize = 64;

pub const MIN_BUCKET_COUNT: usize = 2;
pub const MAX_BUCKET_COUNT: usize = 65536;
pub const MIN_FLUSH_THRESHOLD: usize = 1024;
pub const MAX_FLUSH_THRESHOLD: usize = 16 * 1024 * 1024;
pub const MIN_WORKER_THREADS: usize = 1;
pub const MAX_WORKER_THREADS: usize = 64;
pub const MIN_IO_BUFFER_SIZE_KB: usize = 4;
pub const MAX_IO_BUFFER_SIZE_KB: usize = 16 * 1024;

pub const BYTES_PER_KB: usize = 1024;
pub const BYTES_PER_MB: usize = 1024 * 1024;

pub const BUCKET_FILE_PREFIX: &str = "locations_";
pub const BUCKET_FILE_EXTENSION: &str = ".dat";
pub const WORK_DIR_NAME: &str = "coord_sift_buckets";

pub const PROGRESS_REPORT_INTERVAL_RECORDS: u64 = 1_000_000;
