mod launch;
mod link;
