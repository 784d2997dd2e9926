use maud::{DOCTYPE, Markup, html};

use crate::models::{FilterOptions, Screening};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

pub fn index_page(options: &FilterOptions, screenings: &[Screening]) -> String {
    page(
        "Kinoplan",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-4xl mx-auto px-6 py-12" {
                    h1 class="text-3xl font-bold text-gray-900" { "Kinoplan" }
                    p class="mt-2 text-gray-600" { "Aktuelle Vorstellungen der Berliner Kinos." }

                    form class="mt-8 flex flex-wrap items-center gap-4" method="post" action="/api/screenings" {
                        (selects(options))
                        button class="rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" type="submit" { "Filtern" }
                    }

                    (screening_list(screenings))
                }
            }
        },
    )
}

pub fn selects_fragment(options: &FilterOptions) -> String {
    selects(options).into_string()
}

pub fn screenings_fragment(screenings: &[Screening]) -> String {
    screening_list(screenings).into_string()
}

pub fn error_page(message: String) -> String {
    page(
        "Fehler",
        html! {
            div class="max-w-2xl mx-auto px-6 py-12" {
                div class="bg-white shadow rounded-lg p-8" {
                    h1 class="text-2xl font-bold text-gray-900" { "Fehler" }
                    p class="mt-4 text-gray-700" { (message) }
                    a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Zurück" }
                }
            }
        },
    )
}

fn selects(options: &FilterOptions) -> Markup {
    html! {
        select class="rounded-md border border-gray-300 px-3 py-2" name="scrape-ids" {
            option value="" { "Alle Scrapes" }
            @for id in &options.scrape_ids {
                option value=(id) { (id) }
            }
        }
        select class="rounded-md border border-gray-300 px-3 py-2" name="dates" {
            option value="" { "Alle Tage" }
            @for date in &options.dates {
                option value=(date) { (date.strftime("%a %d.%m.")) }
            }
        }
        select class="rounded-md border border-gray-300 px-3 py-2" name="cinemas" {
            option value="" { "Alle Kinos" }
            @for cinema in &options.cinemas {
                option value=(cinema) { (cinema) }
            }
        }
    }
}

fn screening_list(screenings: &[Screening]) -> Markup {
    html! {
        @if screenings.is_empty() {
            div class="mt-10 bg-white shadow rounded-lg p-8" {
                p class="text-gray-600" { "Keine Vorstellungen gefunden." }
            }
        } @else {
            div class="mt-10 space-y-4" {
                @for screening in screenings {
                    (screening_card(screening))
                }
            }
        }
    }
}

fn screening_card(screening: &Screening) -> Markup {
    html! {
        div class="bg-white shadow rounded-lg p-6 flex gap-6" {
            @if !screening.thumbnail_url.is_empty() {
                img class="h-28 w-20 rounded object-cover" src=(screening.thumbnail_url) alt=(screening.title);
            }
            div {
                a class="text-lg font-semibold text-gray-900 hover:text-blue-700" href=(screening.link) { (screening.title) }
                p class="mt-1 text-gray-600" {
                    (screening.date.strftime("%a %d.%m. %H:%M")) " · " (screening.cinema)
                }
                @if screening.duration > 0 {
                    p class="mt-1 text-sm text-gray-500" { (screening.duration) " min." }
                }
                @if !screening.description.is_empty() {
                    p class="mt-2 text-sm text-gray-600" { (screening.description) }
                }
            }
        }
    }
}

fn page(title: &str, content: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="de" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body { (content) }
        }
    }
    .into_string()
}
