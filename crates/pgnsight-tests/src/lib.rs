pub mod helpers;

#[cfg(test)]
mod review_tests;
#[cfg(test)]
mod stockfish_tests;
