mod app;
use leitner_app::*;

use app::{LOCAL_OWNER, MyApp};
use database::db::{add_card, all_cards, due_count, init_database};

fn main() -> eframe::Result<()> {
    let conn = init_database().expect("Failed to initialize database");

    if all_cards(&conn, LOCAL_OWNER).unwrap_or_default().is_empty() {
        let samples = [
            ("What is the capital of France?", "Paris"),
            ("What is the capital of Poland?", "Warsaw"),
            ("What is the capital of Japan?", "Tokyo"),
        ];
        for (question, answer) in samples {
            let _ = add_card(
                &conn,
                LOCAL_OWNER,
                &NewCard {
                    question: question.to_string(),
                    answer: answer.to_string(),
                },
            );
        }

        println!("Sample data created!");
    }

    let cards = all_cards(&conn, LOCAL_OWNER).unwrap_or_default();
    let due = due_count(&conn, LOCAL_OWNER).unwrap_or(0);
    println!("Loaded {} cards ({} due for review)", cards.len(), due);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([500.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Leitner Flashcards",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Ok(Box::new(MyApp::new_with_store(conn)))
        }),
    )
}
