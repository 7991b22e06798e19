//! Database schema initialization and seed rows

use rusqlite::params;

use super::{Store, SCHEMA_VERSION};
use crate::core::error::EngineResult;
use crate::entities::ReportTypeCode;

impl Store {
    /// Create missing tables and seed report types
    pub(super) fn init_schema(&self) -> EngineResult<()> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Voter source
            CREATE TABLE IF NOT EXISTS voters (
                id INTEGER PRIMARY KEY,
                account_id INTEGER,
                voter_id TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                gender TEXT,
                age INTEGER,
                phone_number TEXT,
                photo TEXT,
                prime1 TEXT NOT NULL DEFAULT 'N',
                prime2 TEXT NOT NULL DEFAULT 'N',
                prime3 TEXT NOT NULL DEFAULT 'N',
                mine TEXT NOT NULL DEFAULT 'N',
                pollsite_id INTEGER,
                assemblydistrict_id INTEGER,
                electiondistrict_id INTEGER,
                ethnicity_id INTEGER,
                language_id INTEGER,
                party_id INTEGER,
                house_number TEXT,
                street_name TEXT,
                street_suffix TEXT,
                city TEXT,
                state TEXT,
                zip TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_voters_account ON voters(account_id);
            CREATE INDEX IF NOT EXISTS idx_voters_mine ON voters(mine);
            CREATE INDEX IF NOT EXISTS idx_voters_pollsite ON voters(pollsite_id);
            CREATE INDEX IF NOT EXISTS idx_voters_assemblydistrict ON voters(assemblydistrict_id);
            CREATE INDEX IF NOT EXISTS idx_voters_electiondistrict ON voters(electiondistrict_id);

            -- Lookup tables
            CREATE TABLE IF NOT EXISTS pollsites (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS assembly_districts (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS election_districts (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS ethnicities (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS languages (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS parties (id INTEGER PRIMARY KEY, name TEXT NOT NULL);

            -- Saved lists
            CREATE TABLE IF NOT EXISTS voter_lists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                columns TEXT NOT NULL,
                filters TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_voter_lists_user ON voter_lists(user_id);

            -- Reports
            CREATE TABLE IF NOT EXISTS report_types (
                id INTEGER PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS report_templates (
                id INTEGER PRIMARY KEY,
                report_type_id INTEGER NOT NULL REFERENCES report_types(id),
                name TEXT NOT NULL,
                file_stem TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                title TEXT NOT NULL,
                columns TEXT NOT NULL,
                filters TEXT NOT NULL,
                report_type_id INTEGER NOT NULL REFERENCES report_types(id),
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS report_tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                report_id INTEGER NOT NULL REFERENCES reports(id),
                status TEXT NOT NULL DEFAULT 'PN',
                orientation TEXT NOT NULL,
                paper_size TEXT NOT NULL,
                output_format TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                template_id INTEGER REFERENCES report_templates(id),
                command TEXT NOT NULL,
                output_path TEXT,
                error TEXT,
                created_at TEXT NOT NULL,
                completed_at TEXT,
                notified_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_report_tasks_user_status ON report_tasks(user_id, status);

            -- Key-value cache
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at TEXT
            );
            "#,
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        self.seed_report_types()
    }

    /// Report types the renderer knows, each with one template
    fn seed_report_types(&self) -> EngineResult<()> {
        let seeds = [
            (1, ReportTypeCode::Single, "Voter", "Voter card", "voter-card"),
            (2, ReportTypeCode::Collection, "Voters", "Voter roster", "voters-roster"),
        ];
        for (id, code, name, template_name, stem) in seeds {
            self.conn.execute(
                "INSERT OR IGNORE INTO report_types (id, code, name) VALUES (?1, ?2, ?3)",
                params![id, code.code(), name],
            )?;
            self.conn.execute(
                "INSERT OR IGNORE INTO report_templates (id, report_type_id, name, file_stem)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, id, template_name, stem],
            )?;
        }
        Ok(())
    }
}
