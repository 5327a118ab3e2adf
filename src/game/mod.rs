pub mod kickoff;
pub mod points;
pub mod ranking;
pub mod round_validity;
