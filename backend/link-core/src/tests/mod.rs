mod launcher;
mod protocol;
