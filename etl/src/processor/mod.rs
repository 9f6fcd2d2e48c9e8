pub mod columns;
pub mod dimension;
pub mod fact;
pub mod metadata;
pub mod temporal;
pub mod udf;
pub mod writer;

pub use dimension::{extract, DimensionSpec, ARTISTS, SONGS, USERS};
pub use fact::{correlate, SONGPLAYS};
pub use metadata::{RunReport, TableMarker, TableReport};
pub use temporal::{decompose, TIME};
pub use writer::{ParquetTableWriter, TableWriter, WriteSpec};

use crate::reader::SourceDataset;
use crate::session::new_session_context;
use crate::storage::StorageManager;
use crate::utils::paths::PathBuilder;
use columns::filter_song_plays;
use common::config::Settings;
use common::Result;
use datafusion::prelude::*;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Composes readers, extractors and the writer into one batch run.
///
/// The run has three phases with no data dependency between them: the
/// catalog phase (songs, artists), the event phase (users, time) and the fact
/// phase (songplays). The fact phase loads both sources itself.
pub struct Pipeline {
    ctx: SessionContext,
    settings: Settings,
    writer: Arc<dyn TableWriter>,
    run_id: String,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Result<Self> {
        let ctx = new_session_context(settings.pipeline.target_partitions);

        let storage = StorageManager::new(settings.storage.clone());
        storage.register_locations(&ctx, &[settings.input_data.as_str(), settings.output_data.as_str()])?;

        let run_id = Uuid::new_v4().to_string();
        let writer = Arc::new(ParquetTableWriter::new(&run_id));

        Ok(Self {
            ctx,
            settings,
            writer,
            run_id,
        })
    }

    pub fn with_writer(mut self, writer: Arc<dyn TableWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Runs every phase. The first failure aborts the run; tables already
    /// written by then stay on disk.
    pub async fn run(&self) -> Result<RunReport> {
        info!(
            run_id = %self.run_id,
            input = %self.settings.input_data,
            output = %self.settings.output_data,
            concurrent = self.settings.pipeline.concurrent_phases,
            "Starting star schema run"
        );

        let (catalog_tables, event_tables, fact_tables) = if self.settings.pipeline.concurrent_phases {
            tokio::try_join!(
                self.process_song_data(),
                self.process_log_data(),
                self.process_songplays()
            )?
        } else {
            (
                self.process_song_data().await?,
                self.process_log_data().await?,
                self.process_songplays().await?,
            )
        };

        let tables = catalog_tables
            .into_iter()
            .chain(event_tables)
            .chain(fact_tables)
            .collect();

        Ok(RunReport {
            run_id: self.run_id.clone(),
            tables,
        })
    }

    /// Catalog phase: songs and artists.
    pub async fn process_song_data(&self) -> Result<Vec<TableReport>> {
        let catalog = self.load(SourceDataset::Catalog).await?;

        let songs = extract(catalog.clone(), &SONGS)?;
        let songs_report = self.persist(songs, SONGS.write_spec()).await?;

        let artists = extract(catalog, &ARTISTS)?;
        let artists_report = self.persist(artists, ARTISTS.write_spec()).await?;

        Ok(vec![songs_report, artists_report])
    }

    /// Event phase: users and time, from song plays only.
    pub async fn process_log_data(&self) -> Result<Vec<TableReport>> {
        let song_plays = filter_song_plays(self.load(SourceDataset::Events).await?)?;

        let users = extract(song_plays.clone(), &USERS)?;
        let users_report = self.persist(users, USERS.write_spec()).await?;

        let time = decompose(song_plays)?;
        let time_report = self.persist(time, TIME).await?;

        Ok(vec![users_report, time_report])
    }

    /// Fact phase: songplays, from fresh loads of both sources.
    pub async fn process_songplays(&self) -> Result<Vec<TableReport>> {
        let events = self.load(SourceDataset::Events).await?;
        let catalog = self.load(SourceDataset::Catalog).await?;

        let songplays = correlate(events, catalog)?;
        let report = self.persist(songplays, SONGPLAYS).await?;

        Ok(vec![report])
    }

    async fn load(&self, dataset: SourceDataset) -> Result<DataFrame> {
        dataset
            .load(&self.ctx, &self.settings.input_data, &self.settings.sources)
            .await
    }

    async fn persist(&self, table: DataFrame, spec: WriteSpec) -> Result<TableReport> {
        let path = PathBuilder::new(&self.settings.output_data)
            .with_table(spec.name)
            .build_table_path();

        let rows = self
            .writer
            .write_table(&self.ctx, table, &spec, &path)
            .await?;
        info!(table = spec.name, rows, %path, "Table completed");

        Ok(TableReport {
            table_name: spec.name,
            path,
            rows,
        })
    }
}
