//! Persistence Layer (C5): bulk upserts, transactional batch flush, and
//! schema validation (§4.5).

pub mod controllers_repo;
pub mod flight_states_repo;
pub mod matches_repo;
pub mod pilots_repo;
pub mod summaries_repo;
pub mod transceivers_repo;

pub use controllers_repo::ControllersRepository;
pub use flight_states_repo::FlightStatesRepository;
pub use matches_repo::MatchesRepository;
pub use pilots_repo::PilotsRepository;
pub use summaries_repo::SummariesRepository;
pub use transceivers_repo::TransceiversRepository;

pub type PgPool = diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<diesel::PgConnection>>;

/// Size below which a batch upsert is sent as a single statement; larger
/// batches are chunked to stay under Postgres's bind-parameter limit, same
/// rationale as the airport loader this pattern is grounded on.
pub const UPSERT_BATCH_SIZE: usize = 1000;
