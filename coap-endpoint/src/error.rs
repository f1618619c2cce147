// Copyright 2019 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use std::fmt::{Debug, Display, Formatter};

/// Type for errors encountered while operating the endpoint engine.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone)]
pub enum Error {
    /// One or more of the supplied arguments are not valid for the given operation.
    InvalidArgument,

    /// There is not enough space in the given buffer to complete the operation.
    OutOfSpace,

    /// An error was encountered while attempting to parse PDU bytes.
    ParseFailure,

    /// The PDU's version field was not CoAP version 1.
    UnsupportedVersion,

    /// The [message code][crate::message::MsgCode] was not recognized by this engine.
    UnknownMessageCode,

    /// A critical option present in the message was not in the known-options bitmap.
    UnhandledCriticalOption,

    /// An I/O error occurred while performing this operation.
    IOError,

    /// The resource named by the request's URI path was not registered.
    ResourceNotFound,

    /// The request's method has no handler registered on the matched resource.
    MethodNotAllowed,

    /// Allocation of a queue node or PDU buffer failed.
    OutOfMemory,

    /// An unspecified error has occurred.
    Unspecified,
}

impl std::convert::From<std::io::Error> for Error {
    fn from(_: std::io::Error) -> Self {
        Error::IOError
    }
}

impl std::convert::From<Error> for core::fmt::Error {
    fn from(_: Error) -> Self {
        core::fmt::Error
    }
}

impl From<std::fmt::Error> for crate::Error {
    fn from(_err: std::fmt::Error) -> Self {
        Error::OutOfSpace
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        <Self as Debug>::fmt(self, f)
    }
}

impl Default for Error {
    fn default() -> Self {
        Error::Unspecified
    }
}

impl std::error::Error for Error {}
