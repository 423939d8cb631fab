mod helpers;
mod lifecycle_test;
mod matching_test;
