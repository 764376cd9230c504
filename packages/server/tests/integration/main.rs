mod history;
mod upload;
