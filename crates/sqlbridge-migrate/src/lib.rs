//! Schema synchronization from the command line.
//!
//! `sqlbridge-migrate` reads model definitions from a JSON file and brings
//! a SQLite database in line with them.
//!
//! # Model file
//!
//! ```json
//! [
//!   {
//!     "name": "User",
//!     "table": "users",
//!     "properties": {
//!       "name": { "type": "String", "limit": 100, "allowNull": false },
//!       "age": { "type": "Number", "index": true }
//!     }
//!   }
//! ]
//! ```
//!
//! Properties keep the order they are written in.
//!
//! # CLI Usage
//!
//! ```bash
//! # Show the statements autoupdate would run
//! sqlbridge-migrate --models models.json plan
//!
//! # Apply them
//! sqlbridge-migrate --models models.json autoupdate
//!
//! # Fail if the database is out of date
//! sqlbridge-migrate --models models.json check
//!
//! # Drop and recreate every table
//! sqlbridge-migrate --models models.json automigrate --force
//! ```

pub mod error;
pub mod models;

pub use error::{ModelFileError, Result};
pub use models::load_models;
