use std::collections::HashMap;

use record_core::Record;

#[derive(Record, Debug, Clone, Default)]
pub struct Lease {
    #[ddb("id,hash-key")]
    pub lease_id: String,
    #[ddb(",version")]
    pub version: u32,
    #[ddb("expireOn,expire")]
    pub expire_on: u64,
    #[ddb_gsi("byPool hash-key")]
    pub pool: String,
    pub holder: String,
    pub labels: HashMap<String, String>,
    #[ddb(",ignore")]
    pub local_note: Option<String>,
}

impl Lease {
    pub fn new(lease_id: &str, pool: &str, holder: &str) -> Self {
        Self {
            lease_id: lease_id.to_owned(),
            version: 1,
            pool: pool.to_owned(),
            holder: holder.to_owned(),
            labels: HashMap::from([("owner".to_owned(), holder.to_owned())]),
            ..Self::default()
        }
    }
}
