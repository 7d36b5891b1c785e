/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error when the file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Invalid file extension.
    #[error("File does not have a supported image extension: {0}")]
    InvalidFileExtension(std::path::PathBuf),

    /// Error to open the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Error to create the image.
    #[error("Failed to create image. {0}")]
    ImageCreationError(#[from] pano_image::ImageError),

    /// Error to decode or encode the image.
    #[error("Failed to decode or encode the image. {0}")]
    ImageCodecError(#[from] image::ImageError),

    /// Error when the image does not fit the codec limits.
    #[error("Image dimensions {0}x{1} exceed the codec limits")]
    ImageTooLarge(usize, usize),
}
