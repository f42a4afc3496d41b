mod kernel;
mod time;
