// Library root
// -----------
// The binary (`main.rs`) only parses arguments and wires these modules
// together; everything it drives lives here so it can be tested without a
// network or a real clipboard.
//
// Module responsibilities:
// - `config`: command line surface and default directory resolution.
// - `watcher`: blocks until a new image file appears in a directory.
// - `upload`: multipart POST of one image and the `Transport` seam.
// - `response`: pulls `data.link` out of the JSON reply.
// - `clipboard`: pipes the link into an external clipboard command.
// - `pipeline`: the watch/settle/upload/copy state machine.
// - `error`: error types for all of the above.
pub mod clipboard;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod response;
pub mod upload;
pub mod watcher;
