pub mod view;
pub mod input;
pub mod bangsim_vis2d;
