//! Main application UI and state management.
//! Handles the flashcard interface, card creation, and review sessions.

use crate::database::db;
use crate::export::json::{export_json_to_path, import_json};
use crate::models::leitner;
use crate::models::{Card, NewCard, ReviewSession};
use chrono::{DateTime, Local};
use eframe::egui;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Owner identity of the desktop app; every store call is scoped to it.
pub const LOCAL_OWNER: &str = "local";

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Main,
    Review,
}

/// Main application state
#[derive(Default)]
pub struct MyApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    cards: Vec<Card>,
    due_count: usize,
    current_question: String,
    current_answer: String,
    conn: Option<Arc<Mutex<Connection>>>,

    current_screen: AppScreen,
    review_session: Option<ReviewSession>,

    current_date: Option<SystemTime>,
    current_date_display: String,
    dark_mode: bool,

    show_result_dialog: bool,
    result_message: String,
}

/// Formats SystemTime as YYYY-MM-DD string
fn format_system_time(time: SystemTime) -> String {
    let datetime: DateTime<Local> = time.into();
    datetime.format("%Y-%m-%d").to_string()
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Review => self.render_review_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) {
            if self.allowed_to_close {
                // Allow close
            } else {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                self.show_confirmation_dialog = true;
            }
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if self.show_result_dialog {
            egui::Window::new("Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.result_message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_result_dialog = false;
                    }
                });
        }
    }
}

impl MyApp {
    /// Creates a new application instance backed by the given store
    pub fn new_with_store(conn: Connection) -> Self {
        let current_date = db::get_current_date(&conn)
            .map(format_system_time)
            .unwrap_or_else(|_| "Unknown".to_string());
        let mut app = Self {
            conn: Some(Arc::new(Mutex::new(conn))),
            current_date_display: current_date,
            ..Default::default()
        };
        app.reload_cards();
        app
    }

    /// Re-reads the owner's cards and due count from the store
    fn reload_cards(&mut self) {
        if let Some(conn) = &self.conn {
            let conn = conn.lock().unwrap();
            match db::all_cards(&conn, LOCAL_OWNER) {
                Ok(cards) => self.cards = cards,
                Err(e) => eprintln!("Failed to load cards: {}", e),
            }
            self.due_count = db::due_count(&conn, LOCAL_OWNER).unwrap_or(0);
            self.current_date = db::get_current_date(&conn).ok();
        }
    }

    /// Renders the main screen with the add form and card overview
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                // Fetch and display current date from database
                if let Some(conn) = &self.conn {
                    if let Ok(conn_guard) = conn.lock() {
                        if let Ok(current_date) = db::get_current_date(&conn_guard) {
                            self.current_date_display = format_system_time(current_date);
                        }
                    }
                }
                ui.label(self.current_date_display.clone());

                if ui.button("Next Day").clicked() {
                    if let Some(conn) = &self.conn {
                        let conn = conn.lock().unwrap();
                        let _ = db::advance_day(&conn);
                        if let Ok(current_date) = db::get_current_date(&conn) {
                            self.current_date_display = format_system_time(current_date);
                        }
                        drop(conn);
                        self.reload_cards();
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if self.dark_mode { "Light Mode" } else { "Dark Mode" };
                    if ui.button(label).clicked() {
                        self.dark_mode = !self.dark_mode;
                        ctx.set_visuals(if self.dark_mode {
                            egui::Visuals::dark()
                        } else {
                            egui::Visuals::light()
                        });
                    }
                });
            });
            ui.separator();

            // Import/Export buttons
            ui.horizontal(|ui| {
                if ui.button("Export Cards").clicked() {
                    self.handle_export();
                }
                if ui.button("Import Cards").clicked() {
                    self.handle_import();
                }
            });

            ui.separator();

            ui.label(format!(
                "You have {} flashcard{} due for review today",
                self.due_count,
                if self.due_count != 1 { "s" } else { "" }
            ));
            if self.due_count > 0 && ui.button("Start Review").clicked() {
                self.start_review_session();
            }

            ui.separator();

            // Card creation section
            ui.heading("Add Flashcard");
            ui.horizontal(|ui| {
                ui.label("Question:");
                ui.text_edit_singleline(&mut self.current_question);
            });
            ui.horizontal(|ui| {
                ui.label("Answer:");
                ui.text_edit_singleline(&mut self.current_answer);
            });
            if ui.button("Add Flashcard").clicked() {
                if !self.current_question.is_empty() && !self.current_answer.is_empty() {
                    if let Some(conn) = &self.conn {
                        let new_card = NewCard {
                            question: self.current_question.clone(),
                            answer: self.current_answer.clone(),
                        };
                        let result = {
                            let conn = conn.lock().unwrap();
                            db::add_card(&conn, LOCAL_OWNER, &new_card)
                        };
                        match result {
                            Ok(_) => {
                                self.current_question.clear();
                                self.current_answer.clear();
                                self.reload_cards();
                            }
                            Err(e) => {
                                self.result_message = format!("Failed to add card: {}", e);
                                self.show_result_dialog = true;
                            }
                        }
                    }
                }
            }

            ui.separator();

            ui.heading(format!("Flashcards ({})", self.cards.len()));

            // We store actions to execute after UI rendering to avoid borrowing conflicts
            let mut action_delete: Option<i64> = None;

            egui::ScrollArea::vertical()
                .id_source("cards_list")
                .max_height(250.0)
                .show(ui, |ui| {
                    for (i, card) in self.cards.iter().enumerate() {
                        ui.group(|ui| {
                            ui.horizontal(|ui| {
                                ui.label(format!("{}. {}", i + 1, card.question));
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        if ui.button("Delete").clicked() {
                                            action_delete = Some(card.id);
                                        }
                                    },
                                );
                            });
                            ui.label(format!("   Answer: {}", card.answer));
                            let due_now = self
                                .current_date
                                .is_some_and(|now| leitner::is_due(card.next_review, now));
                            ui.label(format!(
                                "   Box {} | next review {}{}",
                                card.box_number,
                                format_system_time(card.next_review),
                                if due_now { " (due)" } else { "" }
                            ));
                        });
                    }
                });

            // Execute deferred actions
            if let Some(card_id) = action_delete {
                if let Some(conn) = &self.conn {
                    let result = {
                        let conn = conn.lock().unwrap();
                        db::delete_card(&conn, card_id, LOCAL_OWNER)
                    };
                    if let Err(e) = result {
                        self.result_message = format!("Failed to delete card: {}", e);
                        self.show_result_dialog = true;
                    }
                }
                self.reload_cards();
            }
        });
    }

    /// Renders the review screen with the due-card study flow
    fn render_review_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(session) = &mut self.review_session {
                ui.heading("Review");

                ui.label(session.progress_message());
                ui.label(format!("{} remaining", session.remaining_count()));

                ui.add_space(20.0);

                if session.is_completed() {
                    ui.heading("All caught up!");
                    ui.label(format!(
                        "You reviewed {} card{} this session.",
                        session.reviewed_count,
                        if session.reviewed_count != 1 { "s" } else { "" }
                    ));

                    ui.add_space(20.0);

                    if ui.button("Back to Main Screen").clicked() {
                        self.current_screen = AppScreen::Main;
                        self.review_session = None;
                        self.reload_cards();
                    }
                } else if let Some(card) = session.current_card() {
                    // Clone values to avoid borrowing issues
                    let show_answer = session.show_answer;
                    let box_number = card.box_number;
                    let question = card.question.clone();
                    let answer = card.answer.clone();

                    ui.label(format!("Box {}", box_number));

                    ui.group(|ui| {
                        ui.set_min_height(200.0);
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);

                            ui.heading("Question:");
                            ui.label(&question);

                            ui.add_space(20.0);

                            if show_answer {
                                ui.heading("Answer:");
                                ui.label(&answer);
                            } else {
                                ui.label("(Click 'Show Answer' to reveal)");
                            }

                            ui.add_space(20.0);
                        });
                    });

                    ui.add_space(20.0);

                    // Store actions to execute after UI rendering
                    let mut action_reveal = false;
                    let mut action_answer: Option<bool> = None;
                    let mut action_delete = false;
                    let mut action_back = false;

                    if !show_answer {
                        if ui.button("Show Answer").clicked() {
                            action_reveal = true;
                        }
                    }

                    // Judgment buttons only make sense once the answer is visible
                    if show_answer {
                        ui.horizontal(|ui| {
                            if ui.button("Wrong").clicked() {
                                action_answer = Some(false);
                            }
                            if ui.button("Correct").clicked() {
                                action_answer = Some(true);
                            }
                        });
                    }

                    ui.add_space(20.0);

                    ui.horizontal(|ui| {
                        if ui.button("Delete Card").clicked() {
                            action_delete = true;
                        }
                        if ui.button("Back to Main Screen").clicked() {
                            action_back = true;
                        }
                    });

                    // Execute deferred actions
                    if action_reveal {
                        session.reveal_answer();
                    }
                    if let Some(correct) = action_answer {
                        if let Err(e) = session.answer_current(correct) {
                            self.result_message = format!("Review failed: {}", e);
                            self.show_result_dialog = true;
                        }
                    }
                    if action_delete {
                        if let Err(e) = session.delete_current() {
                            self.result_message = format!("Failed to delete card: {}", e);
                            self.show_result_dialog = true;
                        }
                    }
                    if action_back {
                        self.current_screen = AppScreen::Main;
                        self.review_session = None;
                        self.reload_cards();
                    }
                }
            }
        });
    }

    /// Starts a review session with the cards due today
    fn start_review_session(&mut self) {
        if let Some(conn) = &self.conn {
            let conn_guard = conn.lock().unwrap();
            let due_cards = db::due_cards(&conn_guard, LOCAL_OWNER).unwrap_or_default();
            drop(conn_guard);

            if !due_cards.is_empty() {
                self.review_session = Some(ReviewSession::new_from_due_cards(
                    LOCAL_OWNER.to_string(),
                    due_cards,
                    Arc::clone(conn),
                ));
                self.current_screen = AppScreen::Review;
            }
        }
    }

    /// Handles card export to a JSON file
    fn handle_export(&mut self) {
        // Open file save dialog
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name("flashcards.json")
            .add_filter("JSON files", &["json"])
            .save_file()
        {
            match export_json_to_path(&self.cards, path.to_str().unwrap()) {
                Ok(_) => {
                    self.result_message =
                        format!("Exported {} cards successfully!", self.cards.len());
                    self.show_result_dialog = true;
                }
                Err(e) => {
                    self.result_message = format!("Export failed: {}", e);
                    self.show_result_dialog = true;
                }
            }
        }
    }

    /// Handles card import from a JSON file
    ///
    /// Imported cards get fresh scheduling state: box 1, due immediately.
    fn handle_import(&mut self) {
        // Open file selection dialog
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        {
            match import_json(path.to_str().unwrap()) {
                Ok(deck) => {
                    if let Some(conn) = &self.conn {
                        let conn_guard = conn.lock().unwrap();

                        for new_card in &deck.cards {
                            if let Err(e) = db::add_card(&conn_guard, LOCAL_OWNER, new_card) {
                                self.result_message = format!(
                                    "Failed to import card '{}': {}",
                                    new_card.question, e
                                );
                                self.show_result_dialog = true;
                                return;
                            }
                        }

                        drop(conn_guard);
                    }

                    self.reload_cards();
                    self.result_message =
                        format!("Imported {} cards successfully!", deck.cards.len());
                    self.show_result_dialog = true;
                }
                Err(e) => {
                    self.result_message = format!(
                        "Import failed: {}\n\nPlease check if the file has correct structure:\n{{\n  \"cards\": [{{\"question\": \"...\", \"answer\": \"...\"}}]\n}}",
                        e
                    );
                    self.show_result_dialog = true;
                }
            }
        }
    }
}
