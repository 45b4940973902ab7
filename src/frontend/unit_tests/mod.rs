mod mock;

#[cfg(test)]
mod completion_tests;
