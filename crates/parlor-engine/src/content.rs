//! Question and word corpora the engines load at room start.
//!
//! The content is opaque data as far as the coordination layer is
//! concerned; engines copy what they need into their own state when a
//! game begins.

/// A Jeopardy question with its point value.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JeopardyQuestion {
    pub category: &'static str,
    pub question: &'static str,
    pub answer: &'static str,
    pub value: u32,
}

/// The Jeopardy board, in play order.
pub fn jeopardy_questions() -> Vec<JeopardyQuestion> {
    vec![
        JeopardyQuestion {
            category: "Science",
            question: "What is the chemical symbol for gold?",
            answer: "Au",
            value: 100,
        },
        JeopardyQuestion {
            category: "Science",
            question: "What planet is known as the Red Planet?",
            answer: "Mars",
            value: 100,
        },
        JeopardyQuestion {
            category: "History",
            question: "In what year did World War II end?",
            answer: "1945",
            value: 200,
        },
        JeopardyQuestion {
            category: "History",
            question: "Who was the first President of the United States?",
            answer: "George Washington",
            value: 200,
        },
        JeopardyQuestion {
            category: "Geography",
            question: "What is the capital of Japan?",
            answer: "Tokyo",
            value: 300,
        },
        JeopardyQuestion {
            category: "Geography",
            question: "What is the largest ocean on Earth?",
            answer: "Pacific",
            value: 300,
        },
    ]
}

/// A multiple-choice trivia question. `correct` indexes into `options`.
#[derive(Debug, Clone)]
pub struct TriviaQuestion {
    pub question: &'static str,
    pub options: [&'static str; 4],
    pub correct: usize,
}

pub fn trivia_questions() -> Vec<TriviaQuestion> {
    vec![
        TriviaQuestion {
            question: "Which element has the atomic number 1?",
            options: ["Helium", "Hydrogen", "Oxygen", "Carbon"],
            correct: 1,
        },
        TriviaQuestion {
            question: "How many continents are there?",
            options: ["5", "6", "7", "8"],
            correct: 2,
        },
        TriviaQuestion {
            question: "What is the longest river in the world?",
            options: ["Amazon", "Yangtze", "Mississippi", "Nile"],
            correct: 3,
        },
        TriviaQuestion {
            question: "In which year did the Berlin Wall fall?",
            options: ["1987", "1989", "1991", "1993"],
            correct: 1,
        },
        TriviaQuestion {
            question: "Which planet has the most moons?",
            options: ["Jupiter", "Saturn", "Uranus", "Neptune"],
            correct: 1,
        },
        TriviaQuestion {
            question: "What is the smallest prime number?",
            options: ["0", "1", "2", "3"],
            correct: 2,
        },
        TriviaQuestion {
            question: "Which ocean is the deepest?",
            options: ["Atlantic", "Indian", "Arctic", "Pacific"],
            correct: 3,
        },
        TriviaQuestion {
            question: "Who painted the Mona Lisa?",
            options: [
                "Michelangelo",
                "Raphael",
                "Leonardo da Vinci",
                "Donatello",
            ],
            correct: 2,
        },
    ]
}

/// Words for Hangman, all uppercase A–Z.
pub const HANGMAN_WORDS: &[&str] = &[
    "RUSTACEAN",
    "KEYBOARD",
    "MOUNTAIN",
    "ELEPHANT",
    "SATELLITE",
    "UMBRELLA",
    "VOLCANO",
    "NOTEBOOK",
    "TREASURE",
    "WHISTLE",
    "LANTERN",
    "COMPASS",
    "GALAXY",
    "PENGUIN",
    "HARBOR",
    "THUNDER",
    "BICYCLE",
    "ORCHARD",
    "PYRAMID",
    "JOURNEY",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jeopardy_answers_are_nonempty() {
        for q in jeopardy_questions() {
            assert!(!q.answer.is_empty());
            assert!(q.value > 0);
        }
    }

    #[test]
    fn test_trivia_correct_indices_in_range() {
        for q in trivia_questions() {
            assert!(q.correct < q.options.len());
        }
    }

    #[test]
    fn test_hangman_words_are_uppercase_ascii() {
        for w in HANGMAN_WORDS {
            assert!(w.len() >= 4);
            assert!(w.bytes().all(|b| b.is_ascii_uppercase()));
        }
    }
}
