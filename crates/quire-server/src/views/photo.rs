//! Photo gallery views

use super::layout::{document, year_list, Site};
use maud::{html, Markup};
use quire_core::{Album, Photo, PhotoEntry};

fn thumbnail(site: &Site, href: &str, photo: &Photo) -> Markup {
    html! {
        a.thumb-link href=(href) {
            img src=(site.media(&photo.image)) alt=(photo.title) loading="lazy";
        }
    }
}

pub fn photo_index(site: &Site, photos: &[PhotoEntry], years: &[i32]) -> Markup {
    let content = html! {
        h1 { "Photos" }
        p { a href="/photo/albums/" { "Albums" } }
        div.thumbnail-grid {
            @for entry in photos {
                (thumbnail(site, &entry.url(), &entry.photo))
            }
        }
        (year_list(years))
    };
    document(site, "Photos", Some("photo-index"), content)
}

pub fn album_index(site: &Site, albums: &[Album], years: &[i32]) -> Markup {
    let content = html! {
        h1 { "Albums" }
        ul.albums {
            @for album in albums {
                li {
                    a href=(album.url()) { (album.title) }
                    " "
                    span.meta { (album.created_date.format("%Y-%m-%d")) }
                }
            }
        }
        (year_list(years))
    };
    document(site, "Albums", Some("album-index"), content)
}

pub fn album_detail(site: &Site, album: &Album, photos: &[Photo], years: &[i32]) -> Markup {
    let content = html! {
        header.album-header {
            h1 { (album.title) }
            @if !album.description.is_empty() {
                p.album-description { (album.description) }
            }
        }
        div.thumbnail-grid {
            @for photo in photos {
                (thumbnail(site, &photo.url_in(album), photo))
            }
        }
        (year_list(years))
    };
    document(site, &album.title, Some("album"), content)
}

pub fn photo_detail(site: &Site, album: &Album, photo: &Photo) -> Markup {
    let title = if photo.title.is_empty() { &photo.slug } else { &photo.title };
    let content = html! {
        nav.breadcrumb {
            a href="/photo/albums/" { "Albums" }
            " › "
            a href=(album.url()) { (album.title) }
        }
        figure.photo {
            img src=(site.media(&photo.image)) alt=(title);
            figcaption {
                h1 { (title) }
                @if !photo.description.is_empty() {
                    p { (photo.description) }
                }
            }
        }
    };
    document(site, title, Some("photo"), content)
}
