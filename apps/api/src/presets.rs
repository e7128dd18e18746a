//! Built-in instruction sets per subject and the standard KCSE marking grid.

use crate::models::{GridTable, InstructionBlock, MarkingTableSpec};

pub const DEFAULT_SUBJECT: &str = "Default";

const MATHEMATICS: &[&str] = &[
    "(a) Write your details in the spaces provided above.",
    "(b) Answer all the questions in the spaces provided.",
    "(c) All working must be clearly shown.",
    "(d) Silent and non-programmable electronic calculators may be used.",
    "(e) This paper consists of 10 printed pages.",
    "(f) Candidates should check the question paper to ascertain that all the pages are printed as indicated and that no questions are missing.",
    "(g) Candidates should answer the questions in correct English.",
];

const ENGLISH: &[&str] = &[
    "1. Write your name and admission number clearly in the spaces provided.",
    "2. Answer ALL the questions in this exam paper.",
    "3. Mobile phones and calculators are not allowed unless stated.",
    "4. Use correct grammar and spelling throughout.",
    "5. Do not open this paper until instructed to do so.",
];

const KISWAHILI: &[&str] = &[
    "1. Andika jina lako na nambari ya usajili kwa nafasi zilizotolewa.",
    "2. Jibu MASWALI YOTE katika karatasi hii ya mtihani.",
    "3. Simu za rununu na kikokotoo haziruhusiwi isipokuwa kikitajwa.",
    "4. Karatasi hii ina kurasa 10 zilizochapishwa.",
    "5. Usifungue karatasi hii hadi uelekezwe kufanya hivyo.",
];

const CHEMISTRY: &[&str] = &[
    "1. Write your name and admission number clearly.",
    "2. Answer all the questions in the spaces provided.",
    "3. Scientific calculators and mathematical tables may be used.",
    "4. Read all instructions carefully before attempting any question.",
];

const BIOLOGY: &[&str] = &[
    "1. Read all questions before answering.",
    "2. Use diagrams where necessary.",
    "3. Show all your working clearly.",
    "4. No mobile phones allowed.",
];

const DEFAULT: &[&str] = &[
    "1. Write your name and admission number clearly.",
    "2. Answer all questions.",
    "3. No mobile phones or unauthorized materials allowed.",
    "4. Follow invigilator instructions.",
];

/// Capitalises the first letter of each whitespace-separated word and lowercases the rest.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Returns the preset subject name that `subject` resolves to.
pub fn resolve_subject(subject: &str) -> &'static str {
    match title_case(subject).as_str() {
        "Mathematics" => "Mathematics",
        "English" => "English",
        "Kiswahili" => "Kiswahili",
        "Chemistry" => "Chemistry",
        "Biology" => "Biology",
        _ => DEFAULT_SUBJECT,
    }
}

/// Instructions for `subject`, falling back to the general set for unknown subjects.
pub fn instructions_for(subject: &str) -> InstructionBlock {
    let lines = match resolve_subject(subject) {
        "Mathematics" => MATHEMATICS,
        "English" => ENGLISH,
        "Kiswahili" => KISWAHILI,
        "Chemistry" => CHEMISTRY,
        "Biology" => BIOLOGY,
        _ => DEFAULT,
    };
    InstructionBlock::new(lines.iter().map(|l| l.to_string()).collect())
}

/// The standard two-section score grid printed when a request names no table.
pub fn default_marking_table() -> MarkingTableSpec {
    let rows: [[&str; 4]; 7] = [
        ["A", "1 – 11", "25", ""],
        ["B", "12", "11", ""],
        ["", "13", "11", ""],
        ["", "14", "11", ""],
        ["", "15", "10", ""],
        ["", "16", "12", ""],
        ["TOTAL SCORE", "", "80", ""],
    ];
    MarkingTableSpec::Grid(GridTable {
        columns: None,
        column_widths: Some(vec![80.0, 120.0, 120.0, 150.0]),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
        row_height: 25.0,
        row_heights: None,
    })
}
