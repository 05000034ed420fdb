use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::gemini::TextGenerator;
use crate::model::GenerationMode;
use crate::parser::IdGenerator;
use crate::prompt::custom_matches_sent;
use crate::service::PredictionService;
use crate::state::{Delta, ProviderCommand};

/// Serves commands one at a time until the command channel closes.
pub fn spawn_prediction_provider<G, I>(
    service: PredictionService<G, I>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()>
where
    G: TextGenerator + Send + 'static,
    I: IdGenerator + Send + 'static,
{
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::Generate {
                    mode,
                    custom_matches,
                } => {
                    let sent = match mode {
                        GenerationMode::Standard => custom_matches_sent(&custom_matches).len(),
                        GenerationMode::Sniper => 0,
                    };
                    let _ = tx.send(Delta::Log(format!(
                        "[INFO] {} analysis requested ({sent} custom matches)",
                        mode.label()
                    )));

                    match service.generate(mode, &custom_matches) {
                        Ok(batch) => {
                            if batch.blocks_dropped > 0 {
                                let _ = tx.send(Delta::Log(format!(
                                    "[WARN] Dropped {}/{} match blocks missing teams or prediction",
                                    batch.blocks_dropped, batch.blocks_seen
                                )));
                            }
                            let _ = tx.send(Delta::Log(format!(
                                "[INFO] {} predictions, {} sources",
                                batch.predictions.len(),
                                batch.grounding_urls.len()
                            )));
                            let _ = tx.send(Delta::SetPredictions {
                                mode: batch.mode,
                                predictions: batch.predictions,
                            });
                        }
                        Err(err) => {
                            let _ = tx.send(Delta::Log(format!("[WARN] {err:#}")));
                            let _ = tx.send(Delta::GenerationFailed {
                                mode,
                                message: err.to_string(),
                            });
                        }
                    }
                }
            }
        }
    })
}
