//! Airport reference data (§3, §4.3). Read-only after load.

use diesel::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Deserialize)]
#[diesel(table_name = crate::schema::airports)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Airport {
    pub icao: String,
    pub lat: f64,
    pub lon: f64,
    pub elevation_ft: f64,
}
