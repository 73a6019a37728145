mod dataloader;
mod mnist;
