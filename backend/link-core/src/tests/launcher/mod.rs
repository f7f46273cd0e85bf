mod process;
mod spawn;
