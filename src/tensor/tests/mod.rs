mod index;
mod others;
