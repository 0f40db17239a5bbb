mod checklist_pendencia;
mod checklist_resposta;
mod checklist_resposta_foto;
mod mobile_photo;
mod turno;

pub use checklist_pendencia::{ChecklistPendencia, NewChecklistPendencia, PendenciaStatus};
pub use checklist_resposta::{ChecklistResposta, RespostaComPendencia};
pub use checklist_resposta_foto::{ChecklistRespostaFoto, NewChecklistRespostaFoto};
pub use mobile_photo::MobilePhoto;
pub use turno::{ChecklistPreenchido, Turno};
