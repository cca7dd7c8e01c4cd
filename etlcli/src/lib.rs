pub use crate::app::EtlCliApp;

mod app {
    use anyhow::Result;
    use etlpipe_core::*;
    use log::info;

    pub struct EtlCliApp {
        conf: Conf,
        offline: bool,
        json: bool,
    }

    impl EtlCliApp {
        pub fn new(conf: Conf) -> Self {
            Self {
                conf,
                offline: false,
                json: false,
            }
        }

        /// Skip the network and load the built-in samples.
        pub fn offline(mut self, offline: bool) -> Self {
            self.offline = offline;
            self
        }

        /// Print the whole run summary as JSON instead of text tables.
        pub fn json(mut self, json: bool) -> Self {
            self.json = json;
            self
        }

        pub fn run(&self) -> Result<RunSummary> {
            let source: Box<dyn Source> = if self.offline {
                info!("Offline mode: using fallback samples for every endpoint");
                Box::new(OfflineSource)
            } else {
                Box::new(HttpSource::from_conf(&self.conf))
            };

            let summary = run_pipeline(&self.conf, source.as_ref())?;
            self.print(&summary)?;
            Ok(summary)
        }

        fn print(&self, summary: &RunSummary) -> Result<()> {
            if self.json {
                println!("{}", serde_json::to_string_pretty(summary)?);
                info!(
                    "ETL pipeline finished successfully. Database file: {}",
                    summary.db_path.display()
                );
                return Ok(());
            }

            print!("{}", summary.report);
            println!(
                "\nETL pipeline finished successfully. Database file: {}",
                summary.db_path.display()
            );
            Ok(())
        }
    }
}
