use rusqlite::Connection;

use crate::error::Result;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS img_data (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            filename            TEXT NOT NULL,
            width               INTEGER,
            height              INTEGER,
            size_kb             REAL,
            format              TEXT,
            validation_status   TEXT NOT NULL CHECK (validation_status IN ('PASSED', 'FAILED')),
            notes               TEXT,
            processed_timestamp TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_img_data_status ON img_data(validation_status);
        ",
    )?;
    Ok(())
}
