pub mod checklist_photos;
